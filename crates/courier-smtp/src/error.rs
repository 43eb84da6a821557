//! Error types for SMTP sessions.

use std::io;
use std::time::Duration;

use crate::types::ReplyCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by individual protocol steps.
///
/// These stay inside the session: the public operations collapse them into a
/// `bool` and report a [`SessionError`] to subscribers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Hostname cannot be used as a TLS server name.
    #[error("Invalid hostname for TLS: {0}")]
    InvalidDnsName(String),

    /// Connecting (or the TLS handshake) did not finish in time.
    #[error("Connection not established within {0:?}")]
    ConnectTimeout(Duration),

    /// No complete reply line arrived in time.
    #[error("No response within {0:?}")]
    ResponseTimeout(Duration),

    /// A command could not be flushed in time.
    #[error("Command not sent within {0:?}")]
    SendTimeout(Duration),

    /// Reply line exceeded the length limit without a terminator.
    #[error("Reply line longer than {0} bytes")]
    LineTooLong(usize),

    /// Peer closed the connection.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Operation needs an open connection.
    #[error("Not connected")]
    NotConnected,

    /// STARTTLS requested on a stream that is already encrypted.
    #[error("Connection is already encrypted")]
    AlreadyEncrypted,

    /// Server answered with a code other than the one the step requires.
    #[error("Expected reply {expected}, got {actual}")]
    UnexpectedReply {
        /// Code the step was waiting for.
        expected: ReplyCode,
        /// Code the server sent.
        actual: ReplyCode,
    },

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// `login()` was called with no stored credentials.
    #[error("No credentials configured")]
    MissingCredentials,
}

/// Failure categories reported to subscribers of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionError {
    /// Connecting or upgrading to TLS failed or took too long.
    ConnectionTimeout,
    /// The server did not answer within the response timeout.
    ResponseTimeout,
    /// A command could not be written within the send timeout.
    SendTimeout,
    /// The server replied with a 4xx code, or an unexpected code during setup.
    ServerError,
    /// The server replied with a 5xx code.
    ClientError,
    /// Authentication was rejected or interrupted.
    AuthenticationFailed,
}

impl SessionError {
    /// Returns a short, stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionTimeout => "connection-timeout",
            Self::ResponseTimeout => "response-timeout",
            Self::SendTimeout => "send-timeout",
            Self::ServerError => "server-error",
            Self::ClientError => "client-error",
            Self::AuthenticationFailed => "authentication-failed",
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Byte-stream transport abstraction used by [`Session`](super::Session).
//!
//! The session owns exactly one transport. It never calls two transport
//! operations at once and wraps every call in the matching timeout budget, so
//! implementations only need to block (await) until the operation finishes.

use std::future::Future;

use super::config::{Config, ConnectionKind};
use super::stream::{self, SmtpStream};
use crate::error::{Error, Result};

/// Lifecycle of a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No connection.
    #[default]
    Disconnected,
    /// A connect or TLS handshake is in flight.
    Connecting,
    /// Connected (plain or encrypted).
    Connected,
}

impl TransportState {
    /// Returns true while a connection exists or is being set up.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

/// Line-oriented byte stream the session talks SMTP over.
pub trait Transport: Send {
    /// Opens a connection to `config.host:config.port`. For
    /// [`ConnectionKind::Tls`] this includes the TLS handshake.
    fn connect(&mut self, config: &Config) -> impl Future<Output = Result<()>> + Send;

    /// Reads the next complete line, without its terminator.
    fn read_line(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Writes `data` and flushes it.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Upgrades the open plaintext connection to TLS in place.
    fn start_tls(&mut self, config: &Config) -> impl Future<Output = Result<()>> + Send;

    /// Closes the connection gracefully.
    fn disconnect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Drops the connection immediately, without any shutdown exchange.
    fn reset(&mut self);

    /// Current connection state.
    fn state(&self) -> TransportState;

    /// Returns true once the connection is encrypted.
    fn is_encrypted(&self) -> bool;
}

/// TCP transport with optional implicit TLS or STARTTLS upgrade.
///
/// Certificate verification follows `Config::accept_invalid_certs` at the
/// time of each handshake.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<SmtpStream>,
    state: TransportState,
}

impl TcpTransport {
    /// Creates a disconnected transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn stream_mut(&mut self) -> Result<&mut SmtpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

impl Transport for TcpTransport {
    async fn connect(&mut self, config: &Config) -> Result<()> {
        self.reset();
        self.state = TransportState::Connecting;

        let result = match config.kind {
            ConnectionKind::Plain | ConnectionKind::StartTls => {
                stream::connect(&config.host, config.port).await
            }
            ConnectionKind::Tls => {
                stream::connect_tls(&config.host, config.port, config.accept_invalid_certs).await
            }
        };

        match result {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = TransportState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = TransportState::Disconnected;
                Err(err)
            }
        }
    }

    async fn read_line(&mut self) -> Result<String> {
        let result = self.stream_mut()?.read_line().await;
        if matches!(result, Err(Error::ConnectionClosed)) {
            self.reset();
        }
        result
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream_mut()?.write_all(data).await
    }

    async fn start_tls(&mut self, config: &Config) -> Result<()> {
        let stream = self.stream.take().ok_or(Error::NotConnected)?;
        if stream.is_tls() {
            self.stream = Some(stream);
            return Err(Error::AlreadyEncrypted);
        }

        // The plaintext stream is consumed by the handshake either way
        self.state = TransportState::Connecting;
        match stream
            .upgrade_to_tls(&config.host, config.accept_invalid_certs)
            .await
        {
            Ok(tls) => {
                self.stream = Some(tls);
                self.state = TransportState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = TransportState::Disconnected;
                Err(err)
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        let result = match self.stream.as_mut() {
            Some(stream) => stream.shutdown().await,
            None => Ok(()),
        };
        self.reset();
        result
    }

    fn reset(&mut self) {
        self.stream = None;
        self.state = TransportState::Disconnected;
    }

    fn state(&self) -> TransportState {
        self.state
    }

    fn is_encrypted(&self) -> bool {
        self.stream.as_ref().is_some_and(SmtpStream::is_tls)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_state_is_active() {
        assert!(!TransportState::Disconnected.is_active());
        assert!(TransportState::Connecting.is_active());
        assert!(TransportState::Connected.is_active());
    }

    #[tokio::test]
    async fn test_operations_need_connection() {
        let mut transport = TcpTransport::new();
        assert_eq!(transport.state(), TransportState::Disconnected);
        assert!(matches!(transport.read_line().await, Err(Error::NotConnected)));
        assert!(matches!(
            transport.write_all(b"QUIT\r\n").await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            transport.start_tls(&Config::new("localhost")).await,
            Err(Error::NotConnected)
        ));
        assert!(transport.disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn test_plain_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"220 ready\r\n").await.unwrap();
            let mut buf = [0u8; 6];
            socket.read_exact(&mut buf).await.unwrap();
            buf
        });

        let config = Config::builder("127.0.0.1").port(port).build();
        let mut transport = TcpTransport::new();
        transport.connect(&config).await.unwrap();
        assert_eq!(transport.state(), TransportState::Connected);
        assert!(!transport.is_encrypted());

        assert_eq!(transport.read_line().await.unwrap(), "220 ready");
        transport.write_all(b"QUIT\r\n").await.unwrap();
        assert_eq!(&server.await.unwrap(), b"QUIT\r\n");

        transport.disconnect().await.unwrap();
        assert_eq!(transport.state(), TransportState::Disconnected);
    }

    #[tokio::test]
    async fn test_eof_resets_state() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let config = Config::builder("127.0.0.1").port(port).build();
        let mut transport = TcpTransport::new();
        transport.connect(&config).await.unwrap();
        server.await.unwrap();

        assert!(matches!(
            transport.read_line().await,
            Err(Error::ConnectionClosed)
        ));
        assert_eq!(transport.state(), TransportState::Disconnected);
    }
}

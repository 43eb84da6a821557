//! SMTP session state machine.
//!
//! A session drives one connection through
//! connect → greeting → EHLO → (STARTTLS → EHLO) → AUTH → MAIL/RCPT/DATA → QUIT.
//! Every step sends at most one command, awaits exactly one reply and
//! branches on its code alone.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::config::{Config, ConnectionKind, strip_line_breaks};
use super::transport::{TcpTransport, Transport};
use crate::command::Command;
use crate::error::{Error, Result, SessionError};
use crate::handler::ErrorHandler;
use crate::types::{AuthMechanism, Credentials, MailMessage, RecipientRole, ReplyCode, Response};

/// Whether a read or write reports failures to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signals {
    Emit,
    Suppress,
}

/// A single SMTP client session.
///
/// Public operations return `bool`; the reason for a failure is delivered
/// to subscribers registered with [`Session::subscribe`] and kept in
/// [`Session::last_error`].
pub struct Session<T = TcpTransport> {
    config: Config,
    credentials: Option<Credentials>,
    transport: T,
    response: Response,
    handlers: Vec<Box<dyn ErrorHandler>>,
    last_error: Option<SessionError>,
}

impl Session<TcpTransport> {
    /// Creates a session that connects over TCP.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, TcpTransport::new())
    }
}

impl<T: Transport> Session<T> {
    /// Creates a session over a caller-supplied transport.
    #[must_use]
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            config,
            credentials: None,
            transport,
            response: Response::default(),
            handlers: Vec::new(),
            last_error: None,
        }
    }

    /// Stores credentials for [`Session::login`].
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Registers an error signal subscriber.
    pub fn subscribe(&mut self, handler: impl ErrorHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Connects, reads the greeting, identifies and upgrades to TLS when
    /// configured for STARTTLS.
    ///
    /// Returns false after the first failing step. That step has already
    /// emitted its signal.
    pub async fn connect(&mut self) -> bool {
        match self.establish().await {
            Ok(()) => {
                debug!(
                    host = %self.config.host,
                    encrypted = self.transport.is_encrypted(),
                    "SMTP session ready"
                );
                true
            }
            Err(err) => {
                debug!(host = %self.config.host, error = %err, "SMTP connect failed");
                self.transport.reset();
                false
            }
        }
    }

    /// Authenticates with the stored credentials.
    ///
    /// Fails with [`SessionError::AuthenticationFailed`] when none are stored.
    pub async fn login(&mut self) -> bool {
        let result = match self.credentials.clone() {
            Some(credentials) => self.authenticate(&credentials).await,
            None => Err(Error::MissingCredentials),
        };
        self.finish_login(result)
    }

    /// Authenticates with `credentials`, ignoring any stored ones.
    pub async fn login_with(&mut self, credentials: &Credentials) -> bool {
        let result = self.authenticate(credentials).await;
        self.finish_login(result)
    }

    /// Runs one mail transaction: MAIL FROM, RCPT TO for every recipient
    /// (To, then Cc, then Bcc), DATA, the message and the final dot.
    ///
    /// Stops at the first rejected step. Accepted steps are not undone.
    pub async fn send<M>(&mut self, message: &M) -> bool
    where
        M: MailMessage + Sync + ?Sized,
    {
        match self.transact(message).await {
            Ok(()) => {
                debug!(code = %self.response.code, "SMTP message accepted");
                true
            }
            Err(err) => {
                debug!(error = %err, "SMTP transaction failed");
                if let Error::UnexpectedReply { actual, .. } = err {
                    // 4xx/5xx were already reported by the reader
                    if !actual.is_transient() && !actual.is_permanent() {
                        self.emit(SessionError::ServerError);
                    }
                }
                false
            }
        }
    }

    /// Sends QUIT and closes the connection. Never emits a signal.
    ///
    /// If QUIT cannot be written, an open connection is dropped directly.
    pub async fn quit(&mut self) {
        if let Err(err) = self.write_command(&Command::Quit, Signals::Suppress).await {
            debug!(error = %err, "QUIT not delivered, dropping connection");
            if self.transport.state().is_active() {
                self.transport.reset();
            }
            return;
        }

        match self.read_response(Signals::Suppress).await {
            Ok(ReplyCode::CLOSING) => {}
            Ok(code) => trace!(%code, "unexpected reply to QUIT"),
            Err(err) => trace!(error = %err, "no reply to QUIT"),
        }

        let limit = self.config.send_timeout;
        match timeout(limit, self.transport.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => trace!(error = %err, "disconnect after QUIT failed"),
            Err(_) => self.transport.reset(),
        }
    }

    // Accessors

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the server hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Sets the server hostname used by the next `connect`.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.config.host = host.into();
    }

    /// Returns the server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.config.port
    }

    /// Sets the server port used by the next `connect`.
    pub const fn set_port(&mut self, port: u16) {
        self.config.port = port;
    }

    /// Returns the connection kind.
    #[must_use]
    pub const fn connection_kind(&self) -> ConnectionKind {
        self.config.kind
    }

    /// Changes the connection kind. Any current connection is dropped.
    pub fn set_connection_kind(&mut self, kind: ConnectionKind) {
        self.transport.reset();
        self.config.kind = kind;
    }

    /// Returns the name sent with `EHLO`.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.config.client_name
    }

    /// Sets the name sent with `EHLO`. Line breaks are dropped.
    pub fn set_client_name(&mut self, name: impl Into<String>) {
        self.config.client_name = strip_line_breaks(name.into());
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.config.connect_timeout
    }

    /// Sets the connect timeout.
    pub const fn set_connect_timeout(&mut self, timeout: Duration) {
        self.config.connect_timeout = timeout;
    }

    /// Returns the per-line response timeout.
    #[must_use]
    pub const fn response_timeout(&self) -> Duration {
        self.config.response_timeout
    }

    /// Sets the per-line response timeout.
    pub const fn set_response_timeout(&mut self, timeout: Duration) {
        self.config.response_timeout = timeout;
    }

    /// Returns the per-command send timeout.
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        self.config.send_timeout
    }

    /// Sets the per-command send timeout.
    pub const fn set_send_timeout(&mut self, timeout: Duration) {
        self.config.send_timeout = timeout;
    }

    /// Returns true if certificate verification is disabled.
    #[must_use]
    pub const fn accept_invalid_certs(&self) -> bool {
        self.config.accept_invalid_certs
    }

    /// Enables or disables certificate verification for later handshakes.
    pub const fn set_accept_invalid_certs(&mut self, accept: bool) {
        self.config.accept_invalid_certs = accept;
    }

    /// Returns the stored credentials.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Replaces the stored credentials.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Changes the mechanism of the stored credentials.
    pub fn set_auth_mechanism(&mut self, mechanism: AuthMechanism) {
        if let Some(credentials) = self.credentials.take() {
            self.credentials = Some(credentials.with_mechanism(mechanism));
        }
    }

    /// Returns the last reply line received.
    #[must_use]
    pub fn response_text(&self) -> &str {
        &self.response.text
    }

    /// Returns the code of the last reply line received.
    #[must_use]
    pub const fn response_code(&self) -> ReplyCode {
        self.response.code
    }

    /// Returns the most recent signal emitted by this session.
    #[must_use]
    pub const fn last_error(&self) -> Option<SessionError> {
        self.last_error
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the transport mutably.
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // Protocol steps

    async fn establish(&mut self) -> Result<()> {
        self.response.clear();
        debug!(
            host = %self.config.host,
            port = self.config.port,
            kind = ?self.config.kind,
            "connecting to SMTP server"
        );

        let limit = self.config.connect_timeout;
        let outcome = timeout(limit, self.transport.connect(&self.config)).await;
        if let Err(err) = outcome.unwrap_or(Err(Error::ConnectTimeout(limit))) {
            self.emit(SessionError::ConnectionTimeout);
            return Err(err);
        }

        let greeting = self.wait_for_response().await?;
        self.require_during_setup(greeting, ReplyCode::SERVICE_READY)?;

        self.ehlo().await?;

        if self.config.kind == ConnectionKind::StartTls {
            self.send_command(&Command::StartTls).await?;
            let code = self.wait_for_response().await?;
            self.require_during_setup(code, ReplyCode::SERVICE_READY)?;

            let outcome = timeout(limit, self.transport.start_tls(&self.config)).await;
            if let Err(err) = outcome.unwrap_or(Err(Error::ConnectTimeout(limit))) {
                warn!(error = %err, "TLS upgrade failed");
                self.emit(SessionError::ConnectionTimeout);
                return Err(err);
            }

            self.ehlo().await?;
        }

        Ok(())
    }

    async fn ehlo(&mut self) -> Result<()> {
        let cmd = Command::Ehlo {
            hostname: strip_line_breaks(self.config.client_name.clone()),
        };
        self.send_command(&cmd).await?;
        let code = self.wait_for_response().await?;
        self.require_during_setup(code, ReplyCode::OK)
    }

    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        debug!(
            user = credentials.username(),
            mechanism = credentials.mechanism().as_str(),
            "SMTP authenticating"
        );
        match credentials.mechanism() {
            AuthMechanism::Plain => {
                let cmd = Command::Auth {
                    mechanism: AuthMechanism::Plain,
                    initial_response: Some(credentials.plain_response()),
                };
                self.exchange(&cmd, ReplyCode::AUTH_SUCCESS).await
            }
            AuthMechanism::Login => {
                let cmd = Command::Auth {
                    mechanism: AuthMechanism::Login,
                    initial_response: None,
                };
                self.exchange(&cmd, ReplyCode::AUTH_CONTINUE).await?;

                let cmd = Command::AuthResponse(credentials.encoded_username());
                self.exchange(&cmd, ReplyCode::AUTH_CONTINUE).await?;

                let cmd = Command::AuthResponse(credentials.encoded_password());
                self.exchange(&cmd, ReplyCode::AUTH_SUCCESS).await
            }
        }
    }

    fn finish_login(&mut self, result: Result<()>) -> bool {
        match result {
            Ok(()) => {
                debug!("SMTP authenticated");
                true
            }
            Err(err) => {
                debug!(error = %err, "SMTP authentication failed");
                self.emit(SessionError::AuthenticationFailed);
                false
            }
        }
    }

    async fn transact<M>(&mut self, message: &M) -> Result<()>
    where
        M: MailMessage + Sync + ?Sized,
    {
        let cmd = Command::MailFrom {
            from: message.sender().clone(),
        };
        self.exchange(&cmd, ReplyCode::OK).await?;

        for role in RecipientRole::ALL {
            for to in message.recipients(role) {
                let cmd = Command::RcptTo {
                    to: to.clone(),
                    role,
                };
                self.exchange(&cmd, ReplyCode::OK).await?;
            }
        }

        self.exchange(&Command::Data, ReplyCode::START_DATA).await?;

        self.send_command(&Command::Content(message.render())).await?;
        self.exchange(&Command::EndOfData, ReplyCode::OK).await
    }

    /// Sends one command and requires `expected` in reply.
    async fn exchange(&mut self, cmd: &Command, expected: ReplyCode) -> Result<()> {
        self.send_command(cmd).await?;
        let actual = self.wait_for_response().await?;
        require(actual, expected)
    }

    /// Like [`require`], but a mismatch also emits a server error.
    fn require_during_setup(&mut self, actual: ReplyCode, expected: ReplyCode) -> Result<()> {
        let result = require(actual, expected);
        if result.is_err() {
            self.emit(SessionError::ServerError);
        }
        result
    }

    // Command sender and response reader

    async fn send_command(&mut self, cmd: &Command) -> Result<()> {
        self.write_command(cmd, Signals::Emit).await
    }

    async fn write_command(&mut self, cmd: &Command, signals: Signals) -> Result<()> {
        trace!(command = %cmd.redacted(), "C:");
        let data = cmd.serialize();
        let limit = self.config.send_timeout;

        let outcome = timeout(limit, self.transport.write_all(&data)).await;
        let result = outcome.unwrap_or(Err(Error::SendTimeout(limit)));
        if result.is_err() && signals == Signals::Emit {
            self.emit(SessionError::SendTimeout);
        }
        result
    }

    async fn wait_for_response(&mut self) -> Result<ReplyCode> {
        self.read_response(Signals::Emit).await
    }

    /// Reads lines until one has a space after the code.
    ///
    /// Each line gets a fresh response-timeout window and replaces the
    /// stored response.
    async fn read_response(&mut self, signals: Signals) -> Result<ReplyCode> {
        let limit = self.config.response_timeout;
        trace!("waiting for reply");

        loop {
            let outcome = timeout(limit, self.transport.read_line()).await;
            let line = match outcome.unwrap_or(Err(Error::ResponseTimeout(limit))) {
                Ok(line) => line,
                Err(err) => {
                    if signals == Signals::Emit {
                        self.emit(SessionError::ResponseTimeout);
                    }
                    return Err(err);
                }
            };

            trace!(line = %line, "S:");
            let is_last = self.response.record(line);
            let code = self.response.code;

            if signals == Signals::Emit {
                if code.is_transient() {
                    self.emit(SessionError::ServerError);
                } else if code.is_permanent() {
                    self.emit(SessionError::ClientError);
                }
            }

            if is_last {
                return Ok(code);
            }
        }
    }

    fn emit(&mut self, error: SessionError) {
        warn!(
            %error,
            code = %self.response.code,
            response = %self.response.text,
            "SMTP session error"
        );
        self.last_error = Some(error);
        for handler in &mut self.handlers {
            handler.on_error(error);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("transport", &self.transport)
            .field("response", &self.response)
            .field("handlers", &self.handlers.len())
            .field("last_error", &self.last_error)
            .finish()
    }
}

fn require(actual: ReplyCode, expected: ReplyCode) -> Result<()> {
    if actual.as_u16() == expected.as_u16() {
        Ok(())
    } else {
        Err(Error::UnexpectedReply { expected, actual })
    }
}

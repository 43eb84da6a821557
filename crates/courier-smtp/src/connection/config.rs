//! Session configuration types.

use std::time::Duration;

/// Default connect timeout (also bounds the STARTTLS handshake).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time to wait for each reply line.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time to flush one command.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Default identity announced in `EHLO`.
pub const DEFAULT_CLIENT_NAME: &str = "localhost";

/// Removes CR and LF so a name always fits on one command line.
pub(super) fn strip_line_breaks(mut name: String) -> String {
    if name.contains(['\r', '\n']) {
        name.retain(|c| c != '\r' && c != '\n');
    }
    name
}

/// How the session reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionKind {
    /// No encryption (port 25). **Not recommended for production.**
    #[default]
    Plain,
    /// TLS from the start (port 465).
    Tls,
    /// Start with plaintext, upgrade with STARTTLS (port 587).
    StartTls,
}

impl ConnectionKind {
    /// Returns the default port for this connection kind.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 25,
            Self::Tls => 465,
            Self::StartTls => 587,
        }
    }
}

/// SMTP session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connection kind.
    pub kind: ConnectionKind,
    /// Name sent with `EHLO`.
    pub client_name: String,
    /// Connection (and TLS handshake) timeout.
    pub connect_timeout: Duration,
    /// Per-line reply timeout.
    pub response_timeout: Duration,
    /// Per-command write timeout.
    pub send_timeout: Duration,
    /// Skip server certificate verification. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
}

impl Config {
    /// Creates a plaintext configuration on port 25.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for session configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    kind: ConnectionKind,
    client_name: String,
    connect_timeout: Duration,
    response_timeout: Duration,
    send_timeout: Duration,
    accept_invalid_certs: bool,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            kind: ConnectionKind::Plain,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            accept_invalid_certs: false,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the connection kind.
    #[must_use]
    pub const fn kind(mut self, kind: ConnectionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the name announced with `EHLO`. Line breaks are dropped.
    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = strip_line_breaks(name.into());
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reply timeout.
    #[must_use]
    pub const fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Sets the send timeout.
    #[must_use]
    pub const fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Disables certificate verification.
    ///
    /// Anyone on the path can impersonate the server once this is set.
    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.kind.default_port()),
            kind: self.kind,
            client_name: self.client_name,
            connect_timeout: self.connect_timeout,
            response_timeout: self.response_timeout,
            send_timeout: self.send_timeout,
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(ConnectionKind::Plain.default_port(), 25);
        assert_eq!(ConnectionKind::Tls.default_port(), 465);
        assert_eq!(ConnectionKind::StartTls.default_port(), 587);
    }

    #[test]
    fn test_config_new() {
        let config = Config::new("smtp.example.com");
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 25);
        assert_eq!(config.kind, ConnectionKind::Plain);
        assert_eq!(config.client_name, "localhost");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.response_timeout, Duration::from_secs(5));
        assert_eq!(config.send_timeout, Duration::from_secs(60));
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder("smtp.example.com")
            .port(2525)
            .kind(ConnectionKind::Tls)
            .client_name("client.local")
            .response_timeout(Duration::from_secs(10))
            .send_timeout(Duration::from_secs(30))
            .build();

        assert_eq!(config.port, 2525);
        assert_eq!(config.kind, ConnectionKind::Tls);
        assert_eq!(config.client_name, "client.local");
        assert_eq!(config.response_timeout, Duration::from_secs(10));
        assert_eq!(config.send_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_builder_default_port() {
        let config = Config::builder("smtp.example.com")
            .kind(ConnectionKind::StartTls)
            .build();

        assert_eq!(config.port, 587);
    }

    #[test]
    fn test_client_name_line_breaks_dropped() {
        let config = Config::builder("smtp.example.com")
            .client_name("client\r\nRSET")
            .build();
        assert_eq!(config.client_name, "clientRSET");
        assert_eq!(strip_line_breaks("plain.name".to_string()), "plain.name");
    }

    #[test]
    fn test_accept_invalid_certs_is_opt_in() {
        let config = Config::builder("smtp.example.com")
            .accept_invalid_certs(true)
            .build();
        assert!(config.accept_invalid_certs);
    }
}

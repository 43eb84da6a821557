//! Authentication credentials.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// SASL mechanism used by `login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthMechanism {
    /// PLAIN - single command with an initial response
    #[default]
    Plain,
    /// LOGIN - username and password in separate round trips
    Login,
}

impl AuthMechanism {
    /// Returns the mechanism name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

/// Username, password and the mechanism to present them with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    mechanism: AuthMechanism,
}

impl Credentials {
    /// Creates credentials using the PLAIN mechanism.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mechanism: AuthMechanism::Plain,
        }
    }

    /// Selects the mechanism.
    #[must_use]
    pub const fn with_mechanism(mut self, mechanism: AuthMechanism) -> Self {
        self.mechanism = mechanism;
        self
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the mechanism.
    #[must_use]
    pub const fn mechanism(&self) -> AuthMechanism {
        self.mechanism
    }

    /// PLAIN initial response: `base64("\0" username "\0" password)`.
    #[must_use]
    pub fn plain_response(&self) -> String {
        let credentials = format!("\0{}\0{}", self.username, self.password);
        STANDARD.encode(credentials.as_bytes())
    }

    /// LOGIN username line.
    #[must_use]
    pub fn encoded_username(&self) -> String {
        STANDARD.encode(self.username.as_bytes())
    }

    /// LOGIN password line.
    #[must_use]
    pub fn encoded_password(&self) -> String {
        STANDARD.encode(self.password.as_bytes())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

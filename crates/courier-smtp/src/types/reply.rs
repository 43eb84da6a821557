//! SMTP reply types.

use crate::parser::{is_last_reply_line, parse_code};

/// Most recent reply line received from the server.
///
/// Only the latest line is kept. For a multi-line reply that is the final
/// line once the reader returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    /// Raw line text, without the trailing CRLF.
    pub text: String,
    /// Code parsed from the first three characters of `text`.
    pub code: ReplyCode,
}

impl Response {
    /// Replaces the stored line and recomputes the code.
    ///
    /// Returns true if the line ends the reply.
    pub fn record(&mut self, line: String) -> bool {
        self.code = parse_code(&line);
        let is_last = is_last_reply_line(&line);
        self.text = line;
        is_last
    }

    /// Forgets the last reply.
    pub fn clear(&mut self) {
        self.text.clear();
        self.code = ReplyCode::NONE;
    }
}

/// SMTP reply code.
///
/// Code 0 stands for "nothing parseable" and never matches a code a step
/// requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes the session compares against
impl ReplyCode {
    /// No code could be parsed
    pub const NONE: Self = Self(0);
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Continue with authentication
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
}

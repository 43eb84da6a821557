//! SMTP command builder.

use std::borrow::Cow;

use crate::types::{Address, AuthMechanism, RecipientRole};

/// Line terminator appended to every command.
pub const CRLF: &[u8] = b"\r\n";

/// A single line the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH - Begin authentication
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
        /// Initial response (PLAIN sends the credentials inline)
        initial_response: Option<String>,
    },
    /// Base64 answer to a 334 challenge
    AuthResponse(String),
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: Address,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
        /// Role the recipient was listed under
        role: RecipientRole,
    },
    /// DATA - Begin message data
    Data,
    /// Rendered message text, sent verbatim
    Content(String),
    /// Lone `.` ending the data phase
    EndOfData,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Returns the command text without the line terminator.
    ///
    /// `MAIL FROM` carries a space before the path, and so does `RCPT TO` for
    /// Bcc recipients. To and Cc recipients are written without one.
    #[must_use]
    pub fn line(&self) -> Cow<'_, str> {
        match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}").into(),
            Self::StartTls => "STARTTLS".into(),
            Self::Auth {
                mechanism,
                initial_response: Some(resp),
            } => format!("AUTH {} {resp}", mechanism.as_str()).into(),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.as_str()).into(),
            Self::AuthResponse(resp) => resp.as_str().into(),
            Self::MailFrom { from } => format!("MAIL FROM: <{from}>").into(),
            Self::RcptTo {
                to,
                role: RecipientRole::To | RecipientRole::Cc,
            } => format!("RCPT TO:<{to}>").into(),
            Self::RcptTo {
                to,
                role: RecipientRole::Bcc,
            } => format!("RCPT TO: <{to}>").into(),
            Self::Data => "DATA".into(),
            Self::Content(text) => text.as_str().into(),
            Self::EndOfData => ".".into(),
            Self::Quit => "QUIT".into(),
        }
    }

    /// Serializes the command to bytes, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = self.line();
        let mut buf = Vec::with_capacity(line.len() + CRLF.len());
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(CRLF);
        buf
    }

    /// Text safe to put in logs: credentials and message content are elided.
    #[must_use]
    pub fn redacted(&self) -> Cow<'_, str> {
        match self {
            Self::Auth {
                mechanism,
                initial_response: Some(_),
            } => format!("AUTH {} <redacted>", mechanism.as_str()).into(),
            Self::AuthResponse(_) => "<redacted>".into(),
            Self::Content(text) => format!("<message, {} bytes>", text.len()).into(),
            _ => self.line(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn rcpt(role: RecipientRole) -> Command {
        Command::RcptTo {
            to: Address::new("recipient@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_ehlo_command() {
        let cmd = Command::Ehlo {
            hostname: "client.example.com".to_string(),
        };
        assert_eq!(cmd.serialize(), b"EHLO client.example.com\r\n");
    }

    #[test]
    fn test_starttls_command() {
        assert_eq!(Command::StartTls.serialize(), b"STARTTLS\r\n");
    }

    #[test]
    fn test_auth_plain() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
    }

    #[test]
    fn test_auth_login() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        assert_eq!(cmd.serialize(), b"AUTH LOGIN\r\n");
        assert_eq!(
            Command::AuthResponse("dXNlcg==".to_string()).serialize(),
            b"dXNlcg==\r\n"
        );
    }

    #[test]
    fn test_mail_from() {
        let cmd = Command::MailFrom {
            from: Address::new("sender@example.com").unwrap(),
        };
        assert_eq!(cmd.serialize(), b"MAIL FROM: <sender@example.com>\r\n");
    }

    #[test]
    fn test_rcpt_to_spacing_by_role() {
        assert_eq!(
            rcpt(RecipientRole::To).serialize(),
            b"RCPT TO:<recipient@example.com>\r\n"
        );
        assert_eq!(
            rcpt(RecipientRole::Cc).serialize(),
            b"RCPT TO:<recipient@example.com>\r\n"
        );
        assert_eq!(
            rcpt(RecipientRole::Bcc).serialize(),
            b"RCPT TO: <recipient@example.com>\r\n"
        );
    }

    #[test]
    fn test_data_phase_commands() {
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(
            Command::Content("Subject: x\r\n\r\nbody".to_string()).serialize(),
            b"Subject: x\r\n\r\nbody\r\n"
        );
        assert_eq!(Command::EndOfData.serialize(), b".\r\n");
    }

    #[test]
    fn test_quit_command() {
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn test_redacted_hides_credentials() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
        };
        assert_eq!(cmd.redacted(), "AUTH PLAIN <redacted>");
        assert_eq!(
            Command::AuthResponse("cGFzcw==".to_string()).redacted(),
            "<redacted>"
        );
        assert_eq!(Command::Content("abc".to_string()).redacted(), "<message, 3 bytes>");
        assert_eq!(Command::Quit.redacted(), "QUIT");
    }
}

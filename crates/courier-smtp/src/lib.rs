//! # courier-smtp
//!
//! An SMTP client session that delivers one message per connection.
//!
//! ## Features
//!
//! - **Connection kinds**: plaintext, implicit TLS (port 465) and STARTTLS
//! - **Authentication**: PLAIN and LOGIN
//! - **Three timeout budgets**: connect (including TLS handshakes), per-line
//!   response and per-command send
//! - **Error signals**: failures are reported to subscribers as
//!   [`SessionError`] values while operations return `bool`
//! - **Pluggable transport**: [`TcpTransport`] by default, any
//!   [`Transport`] for tests or custom streams
//!
//! ## Quick Start
//!
//! ```ignore
//! use courier_smtp::{Address, Config, ConnectionKind, Credentials, Message, Session};
//! use courier_smtp::handler::LoggingHandler;
//!
//! #[tokio::main]
//! async fn main() -> courier_smtp::Result<()> {
//!     let config = Config::builder("smtp.example.com")
//!         .kind(ConnectionKind::StartTls)
//!         .client_name("client.example.com")
//!         .build();
//!
//!     let mut session = Session::new(config)
//!         .with_credentials(Credentials::new("user@example.com", "password"));
//!     session.subscribe(LoggingHandler);
//!
//!     let message = Message::new(
//!         Address::new("user@example.com")?,
//!         "Subject: Test\r\n\r\nHello, World!",
//!     )
//!     .to(Address::new("recipient@example.com")?);
//!
//!     if session.connect().await && session.login().await && session.send(&message).await {
//!         println!("sent: {}", session.response_text());
//!     }
//!     session.quit().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Session flow
//!
//! ```text
//! connect ─→ 220 ─→ EHLO/250 ─┬─────────────────────────────────┬─→ login ─→ send ─→ quit
//!                             └─ STARTTLS/220 ─→ TLS ─→ EHLO/250 ┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command lines
//! - [`connection`]: Session, configuration and transports
//! - [`handler`]: Error signal subscribers
//! - [`parser`]: Reply line parsing
//! - [`types`]: Addresses, credentials, messages and replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod handler;
pub mod parser;
pub mod types;

pub use connection::{
    Config, ConfigBuilder, ConnectionKind, Session, TcpTransport, Transport, TransportState,
};
pub use error::{Error, Result, SessionError};
pub use types::{
    Address, AuthMechanism, Credentials, MailMessage, Message, RecipientRole, ReplyCode, Response,
};

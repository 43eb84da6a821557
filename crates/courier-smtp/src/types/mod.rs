//! Core SMTP types.

mod address;
mod credentials;
mod message;
mod reply;

pub use address::{Address, RecipientRole};
pub use credentials::{AuthMechanism, Credentials};
pub use message::{MailMessage, Message};
pub use reply::{ReplyCode, Response};

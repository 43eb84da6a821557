//! Messages handed to a session for delivery.

use super::{Address, RecipientRole};

/// Source of everything a mail transaction needs.
///
/// The session never looks inside the body; headers, MIME structure and
/// encoding are the implementor's business.
pub trait MailMessage {
    /// Envelope sender.
    fn sender(&self) -> &Address;

    /// Recipients for one role, in submission order.
    fn recipients(&self, role: RecipientRole) -> &[Address];

    /// Fully rendered message text, sent verbatim after `DATA`.
    fn render(&self) -> String;
}

/// A message whose body is already rendered.
#[derive(Debug, Clone)]
pub struct Message {
    /// Sender address.
    pub from: Address,
    /// Recipient addresses.
    pub to: Vec<Address>,
    /// CC addresses.
    pub cc: Vec<Address>,
    /// BCC addresses.
    pub bcc: Vec<Address>,
    /// Rendered message text.
    pub body: String,
}

impl Message {
    /// Creates a new message with no recipients.
    #[must_use]
    pub fn new(from: Address, body: impl Into<String>) -> Self {
        Self {
            from,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: Address) -> Self {
        self.to.push(recipient);
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: Address) -> Self {
        self.cc.push(recipient);
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: Address) -> Self {
        self.bcc.push(recipient);
        self
    }

    /// Total number of envelope recipients.
    #[must_use]
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}

impl MailMessage for Message {
    fn sender(&self) -> &Address {
        &self.from
    }

    fn recipients(&self, role: RecipientRole) -> &[Address] {
        match role {
            RecipientRole::To => &self.to,
            RecipientRole::Cc => &self.cc,
            RecipientRole::Bcc => &self.bcc,
        }
    }

    fn render(&self) -> String {
        self.body.clone()
    }
}

//! Error signal subscribers.
//!
//! A [`Session`](crate::Session) reports every failure category it detects
//! to its registered handlers, synchronously, from the call that detected it.
//! Public operations still only return `bool`; the handlers are where the
//! reason goes.
//!
//! # Example
//!
//! ```ignore
//! use courier_smtp::handler::ErrorHandler;
//! use courier_smtp::SessionError;
//!
//! struct Counter(usize);
//!
//! impl ErrorHandler for Counter {
//!     fn on_error(&mut self, _error: SessionError) {
//!         self.0 += 1;
//!     }
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use crate::error::SessionError;

/// Receives error signals from a session.
pub trait ErrorHandler: Send {
    /// Called once per emitted signal, in emission order.
    fn on_error(&mut self, error: SessionError);
}

/// A handler that ignores every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl ErrorHandler for NoopHandler {
    fn on_error(&mut self, _error: SessionError) {}
}

/// A handler that logs signals using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ErrorHandler for LoggingHandler {
    fn on_error(&mut self, error: SessionError) {
        tracing::warn!(%error, "SMTP session error");
    }
}

/// A handler that collects signals into a shared list.
///
/// Clones share the same list, so one clone can be registered with a
/// session while another is kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectingHandler {
    events: Arc<Mutex<Vec<SessionError>>>,
}

impl CollectingHandler {
    /// Creates a new collecting handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the collected signals.
    #[must_use]
    pub fn events(&self) -> Vec<SessionError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Takes all collected signals, leaving the handler empty.
    pub fn take(&self) -> Vec<SessionError> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Clears all collected signals.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ErrorHandler for CollectingHandler {
    fn on_error(&mut self, error: SessionError) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }
}

/// Forwards signals into a tokio channel. A closed receiver is ignored.
impl ErrorHandler for UnboundedSender<SessionError> {
    fn on_error(&mut self, error: SessionError) {
        let _ = self.send(error);
    }
}

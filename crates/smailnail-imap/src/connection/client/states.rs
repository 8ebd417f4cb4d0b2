//! Connection states.

use std::sync::Arc;

use crate::types::MailboxStatus;

/// Before LOGIN.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox open.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is open; carries what SELECT or EXAMINE reported.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Arc<str>,
    pub(crate) status: MailboxStatus,
}

impl Selected {
    /// Creates the state for `mailbox`.
    #[must_use]
    pub fn new(mailbox: impl Into<Arc<str>>, status: MailboxStatus) -> Self {
        Self {
            mailbox: mailbox.into(),
            status,
        }
    }

    /// Name of the open mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Status snapshot from the SELECT or EXAMINE response.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }
}

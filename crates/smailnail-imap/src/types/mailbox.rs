//! Mailbox names and what SELECT reports about them.

use std::fmt;

use super::{Flags, SeqNum, Uid, UidValidity};

/// A mailbox name, sent as an astring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(String);

impl Mailbox {
    /// Wraps `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Mailbox {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counts and response codes from SELECT or EXAMINE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// `* n EXISTS`.
    pub exists: u32,
    /// `* n RECENT`.
    pub recent: u32,
    /// `[UNSEEN n]`.
    pub unseen: Option<SeqNum>,
    /// `[UIDNEXT n]`.
    pub uid_next: Option<Uid>,
    /// `[UIDVALIDITY n]`.
    pub uid_validity: Option<UidValidity>,
    /// `* FLAGS (...)`.
    pub flags: Flags,
    /// `[PERMANENTFLAGS (...)]`.
    pub permanent_flags: Flags,
    /// `[READ-ONLY]`, or opened with EXAMINE.
    pub read_only: bool,
}

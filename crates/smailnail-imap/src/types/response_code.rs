//! Bracketed response codes (`[UIDNEXT 42]`, `[READ-ONLY]`, ...).

use super::{Capability, Flag, SeqNum, Uid, UidValidity};

/// Response code attached to a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: text that must be shown to the user.
    Alert,
    /// CAPABILITY list sent inline with a greeting or login reply.
    Capability(Vec<Capability>),
    /// PERMANENTFLAGS: flags that can be changed permanently.
    PermanentFlags(Vec<Flag>),
    /// READ-ONLY
    ReadOnly,
    /// READ-WRITE
    ReadWrite,
    /// TRYCREATE: target mailbox does not exist.
    TryCreate,
    /// UIDNEXT
    UidNext(Uid),
    /// UIDVALIDITY
    UidValidity(UidValidity),
    /// UNSEEN: first unseen sequence number.
    Unseen(SeqNum),
    /// Any other code, kept verbatim.
    Unknown(String),
}

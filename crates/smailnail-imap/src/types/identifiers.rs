//! Message identifiers.
//!
//! Sequence numbers are positional and shift on expunge; UIDs are stable
//! for as long as the mailbox UIDVALIDITY does not change.

use std::num::NonZeroU32;

macro_rules! nonzero_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Wraps a raw value. Returns `None` for 0.
            #[must_use]
            pub fn new(n: u32) -> Option<Self> {
                NonZeroU32::new(n).map(Self)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

nonzero_id!(
    /// Message sequence number (1-based position in the selected mailbox).
    SeqNum
);

nonzero_id!(
    /// Unique identifier of a message within a mailbox.
    Uid
);

nonzero_id!(
    /// UIDVALIDITY of a mailbox. A change invalidates every stored UID.
    UidValidity
);

impl From<Uid> for SeqNum {
    fn from(uid: Uid) -> Self {
        Self(uid.0)
    }
}

//! Command-related type definitions.

use chrono::NaiveDate;

use crate::types::{Flag, SequenceSet, UidSet};

/// FETCH items to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// FLAGS INTERNALDATE RFC822.SIZE
    Fast,
    /// Explicit list of attributes.
    Items(Vec<FetchAttribute>),
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// RFC822 size.
    Rfc822Size,
    /// Envelope structure.
    Envelope,
    /// Body structure.
    BodyStructure,
    /// UID.
    Uid,
    /// Body section.
    Body {
        /// Section specifier; `None` fetches the whole message.
        section: Option<String>,
        /// Peek (don't set \Seen).
        peek: bool,
        /// Partial fetch range.
        partial: Option<(u32, u32)>,
    },
}

impl FetchAttribute {
    /// `BODY.PEEK[section]`
    #[must_use]
    pub fn peek_section(section: impl Into<String>) -> Self {
        Self::Body {
            section: Some(section.into()),
            peek: true,
            partial: None,
        }
    }

    /// `BODY.PEEK[]`, the full raw message.
    #[must_use]
    pub const fn peek_message() -> Self {
        Self::Body {
            section: None,
            peek: true,
            partial: None,
        }
    }
}

/// STORE action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Replace flags.
    SetFlags(Vec<Flag>),
    /// Add flags.
    AddFlags(Vec<Flag>),
    /// Remove flags.
    RemoveFlags(Vec<Flag>),
}

/// SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages carrying the flag (`SEEN`, `KEYWORD $x`, ...).
    HasFlag(Flag),
    /// Messages lacking the flag (`UNSEEN`, `UNKEYWORD $x`, ...).
    LacksFlag(Flag),
    /// Sequence number set.
    SequenceSet(SequenceSet),
    /// UID set.
    Uid(UidSet),
    /// Subject contains text.
    Subject(String),
    /// From contains text.
    From(String),
    /// To contains text.
    To(String),
    /// Cc contains text.
    Cc(String),
    /// Bcc contains text.
    Bcc(String),
    /// Body contains text.
    Body(String),
    /// Text in header or body.
    Text(String),
    /// Internal date on or after the day.
    Since(NaiveDate),
    /// Internal date before the day.
    Before(NaiveDate),
    /// Internal date within the day.
    On(NaiveDate),
    /// Larger than size in bytes.
    Larger(u64),
    /// Smaller than size in bytes.
    Smaller(u64),
    /// Header field contains value.
    Header(String, String),
    /// AND of criteria.
    And(Vec<Self>),
    /// OR of criteria.
    Or(Box<Self>, Box<Self>),
    /// NOT of criteria.
    Not(Box<Self>),
}

impl SearchCriteria {
    /// Conjunction of `self` and `other`.
    ///
    /// `All` is the identity and nested `And` lists are flattened, so a chain
    /// of conjunctions serializes as a single flat key list.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::All, c) | (c, Self::All) => c,
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), c) => {
                a.push(c);
                Self::And(a)
            }
            (c, Self::And(mut b)) => {
                b.insert(0, c);
                Self::And(b)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Conjunction of every item; `All` for an empty input.
    #[must_use]
    pub fn all_of(items: impl IntoIterator<Item = Self>) -> Self {
        items.into_iter().fold(Self::All, Self::and)
    }

    /// Disjunction of two criteria.
    #[must_use]
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }

    /// Negation.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Returns true if any string argument needs the UTF-8 charset.
    #[must_use]
    pub fn needs_utf8(&self) -> bool {
        match self {
            Self::Subject(s)
            | Self::From(s)
            | Self::To(s)
            | Self::Cc(s)
            | Self::Bcc(s)
            | Self::Body(s)
            | Self::Text(s) => !s.is_ascii(),
            Self::Header(name, value) => !name.is_ascii() || !value.is_ascii(),
            Self::And(items) => items.iter().any(Self::needs_utf8),
            Self::Or(a, b) => a.needs_utf8() || b.needs_utf8(),
            Self::Not(inner) => inner.needs_utf8(),
            _ => false,
        }
    }
}

/// ESEARCH `RETURN (...)` options (RFC 4731).
///
/// An empty option set sends a plain SEARCH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SearchOptions {
    /// RETURN ALL: every matching number.
    pub all: bool,
    /// RETURN COUNT: number of matches.
    pub count: bool,
    /// RETURN MIN: lowest match.
    pub min: bool,
    /// RETURN MAX: highest match.
    pub max: bool,
}

impl SearchOptions {
    /// `RETURN (ALL COUNT)`
    #[must_use]
    pub const fn all_and_count() -> Self {
        Self {
            all: true,
            count: true,
            min: false,
            max: false,
        }
    }

    /// Returns true if no option is requested.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.all || self.count || self.min || self.max)
    }
}

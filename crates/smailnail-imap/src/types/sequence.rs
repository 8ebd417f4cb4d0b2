//! Sequence sets for message ranges.

use super::{SeqNum, Uid};

/// Sequence set for specifying message ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(SeqNum),
    /// Range of sequence numbers (inclusive).
    Range(SeqNum, SeqNum),
    /// Range from start to end of mailbox.
    RangeFrom(SeqNum),
    /// All messages (*).
    All,
    /// Multiple sequence specifications.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a sequence set from a single number.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// Creates a range sequence set.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }

    /// Builds the most compact set covering `numbers`.
    ///
    /// Numbers are sorted and deduplicated; consecutive runs collapse into
    /// ranges. Zeros are ignored. Returns `None` when nothing remains.
    #[must_use]
    pub fn from_numbers(numbers: impl IntoIterator<Item = u32>) -> Option<Self> {
        let runs = coalesce(numbers);
        let mut parts: Vec<Self> = runs
            .into_iter()
            .filter_map(|(start, end)| {
                if start == end {
                    Self::single(start)
                } else {
                    Self::range(start, end)
                }
            })
            .collect();
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::Set(parts)),
        }
    }

    /// Parses the wire form (`2,10:11`, `5:*`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = Vec::new();
        for item in s.split(',') {
            let part = match item.split_once(':') {
                Some((start, "*")) => Self::RangeFrom(SeqNum::new(start.parse().ok()?)?),
                Some((start, end)) => Self::range(start.parse().ok()?, end.parse().ok()?)?,
                None if item == "*" => Self::All,
                None => Self::single(item.parse().ok()?)?,
            };
            parts.push(part);
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::Set(parts)),
        }
    }

    /// Expands the set into individual numbers.
    ///
    /// Returns `None` if the set contains `*`, whose value depends on the
    /// mailbox.
    #[must_use]
    pub fn expand(&self) -> Option<Vec<u32>> {
        let mut out = Vec::new();
        self.expand_into(&mut out)?;
        Some(out)
    }

    fn expand_into(&self, out: &mut Vec<u32>) -> Option<()> {
        match self {
            Self::Single(n) => out.push(n.get()),
            Self::Range(a, b) => {
                let (lo, hi) = if a <= b { (*a, *b) } else { (*b, *a) };
                out.extend(lo.get()..=hi.get());
            }
            Self::RangeFrom(_) | Self::All => return None,
            Self::Set(items) => {
                for item in items {
                    item.expand_into(out)?;
                }
            }
        }
        Some(())
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

/// UID-based sequence set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// Single UID.
    Single(Uid),
    /// Range of UIDs (inclusive).
    Range(Uid, Uid),
    /// Range from start to highest UID.
    RangeFrom(Uid),
    /// All messages.
    All,
    /// Multiple UID specifications.
    Set(Vec<Self>),
}

impl UidSet {
    /// Creates a UID set from a single UID.
    #[must_use]
    pub const fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// Creates a UID set from a range.
    #[must_use]
    pub const fn range(start: Uid, end: Uid) -> Self {
        Self::Range(start, end)
    }

    /// Builds the most compact set covering `uids`. Returns `None` for an
    /// empty input.
    #[must_use]
    pub fn from_uids(uids: impl IntoIterator<Item = Uid>) -> Option<Self> {
        let mut parts: Vec<Self> = coalesce(uids.into_iter().map(Uid::get))
            .into_iter()
            .filter_map(|(start, end)| {
                let start = Uid::new(start)?;
                let end = Uid::new(end)?;
                Some(if start == end {
                    Self::Single(start)
                } else {
                    Self::Range(start, end)
                })
            })
            .collect();
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::Set(parts)),
        }
    }

    /// Converts this UID set to a sequence set for use in UID commands,
    /// whose serialization shares the sequence-set grammar.
    #[must_use]
    pub fn as_sequence_set(&self) -> SequenceSet {
        match self {
            Self::Single(uid) => SequenceSet::Single((*uid).into()),
            Self::Range(start, end) => SequenceSet::Range((*start).into(), (*end).into()),
            Self::RangeFrom(start) => SequenceSet::RangeFrom((*start).into()),
            Self::All => SequenceSet::All,
            Self::Set(items) => SequenceSet::Set(items.iter().map(Self::as_sequence_set).collect()),
        }
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_sequence_set().fmt(f)
    }
}

/// Sorts, deduplicates and groups numbers into inclusive runs.
fn coalesce(numbers: impl IntoIterator<Item = u32>) -> Vec<(u32, u32)> {
    let mut sorted: Vec<u32> = numbers.into_iter().filter(|n| *n != 0).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut runs: Vec<(u32, u32)> = Vec::new();
    for n in sorted {
        match runs.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(n) => *end = n,
            _ => runs.push((n, n)),
        }
    }
    runs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_forms() {
        assert_eq!(SequenceSet::single(42).unwrap().to_string(), "42");
        assert_eq!(SequenceSet::range(1, 100).unwrap().to_string(), "1:100");
        assert_eq!(
            SequenceSet::RangeFrom(SeqNum::new(50).unwrap()).to_string(),
            "50:*"
        );
        assert_eq!(SequenceSet::All.to_string(), "*");
    }

    #[test]
    fn zero_is_not_a_sequence_number() {
        assert!(SequenceSet::single(0).is_none());
        assert!(SequenceSet::range(0, 10).is_none());
    }

    #[test]
    fn from_numbers_collapses_runs() {
        let set = SequenceSet::from_numbers([17, 3, 16, 15, 1, 2, 9]).unwrap();
        assert_eq!(set.to_string(), "1:3,9,15:17");
    }

    #[test]
    fn from_numbers_empty() {
        assert!(SequenceSet::from_numbers([]).is_none());
        assert!(SequenceSet::from_numbers([0]).is_none());
    }

    #[test]
    fn parse_esearch_style_set() {
        let set = SequenceSet::parse("2,10:11").unwrap();
        assert_eq!(set.expand().unwrap(), vec![2, 10, 11]);
    }

    #[test]
    fn expand_refuses_star() {
        assert!(SequenceSet::parse("5:*").unwrap().expand().is_none());
        assert!(SequenceSet::parse("x").is_none());
    }

    #[test]
    fn uid_set_from_uids() {
        let uids = [7, 5, 6, 100].map(|n| Uid::new(n).unwrap());
        assert_eq!(UidSet::from_uids(uids).unwrap().to_string(), "5:7,100");
        assert!(UidSet::from_uids([]).is_none());
    }

    #[test]
    fn uid_set_display_matches_sequence_grammar() {
        let set = UidSet::RangeFrom(Uid::new(100).unwrap());
        assert_eq!(set.to_string(), "100:*");
    }

    proptest! {
        #[test]
        fn from_numbers_expands_to_sorted_unique(input in proptest::collection::vec(1u32..500, 1..60)) {
            let set = SequenceSet::from_numbers(input.clone()).unwrap();
            let mut expected = input;
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(set.expand().unwrap(), expected.clone());
            prop_assert_eq!(SequenceSet::parse(&set.to_string()).unwrap().expand().unwrap(), expected);
        }
    }
}

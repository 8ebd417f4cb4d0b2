//! Newest-first pagination over search results.

use smailnail_imap::SearchData;
use tracing::warn;

use crate::rule::Pagination;

/// Sequence numbers chosen for retrieval, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWindow {
    seqs: Vec<u32>,
    total: u32,
}

impl MessageWindow {
    /// Creates a window; `seqs` must already be newest first.
    #[must_use]
    pub const fn new(seqs: Vec<u32>, total: u32) -> Self {
        Self { seqs, total }
    }

    /// Sequence numbers, newest first.
    #[must_use]
    pub fn seqs(&self) -> &[u32] {
        &self.seqs
    }

    /// Matches before pagination.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Number of messages in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    /// True if the window selects nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }
}

/// Outcome of windowing a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowPlan {
    /// Nothing to fetch.
    Empty,
    /// The window is known.
    Ready(MessageWindow),
    /// The server reported a count but no numbers; the sequence range
    /// `first..=last` must be fetched to learn which messages exist.
    Reconstruct {
        /// Lowest sequence number.
        first: u32,
        /// Highest sequence number.
        last: u32,
        /// Matches before pagination.
        total: u32,
    },
}

/// Applies `pagination` to a search result.
///
/// Offset counts back from the newest match, so offset 0 with limit N is the
/// N most recent matches.
#[must_use]
pub fn window(matches: &SearchData, pagination: &Pagination) -> WindowPlan {
    let mut seqs = matches.all.clone();
    seqs.sort_unstable();
    seqs.dedup();

    let count = matches.count.unwrap_or(0);
    let total = if count > 0 {
        count
    } else {
        u32::try_from(seqs.len()).unwrap_or(u32::MAX)
    };
    if total == 0 {
        return WindowPlan::Empty;
    }

    if seqs.is_empty() {
        let limit = if pagination.limit > 0 {
            pagination.limit.min(total)
        } else {
            total
        };
        if pagination.offset >= total {
            warn!(offset = pagination.offset, total, "offset exceeds match count");
            return WindowPlan::Empty;
        }
        let last = total - pagination.offset;
        let first = last.saturating_sub(limit - 1).max(1);
        return WindowPlan::Reconstruct { first, last, total };
    }

    WindowPlan::Ready(paginate(&seqs, pagination, total))
}

/// Newest-first page of ascending `seqs`.
#[must_use]
pub fn paginate(seqs: &[u32], pagination: &Pagination, total: u32) -> MessageWindow {
    let len = seqs.len();
    let limit = match usize::try_from(pagination.limit) {
        Ok(0) | Err(_) => len,
        Ok(limit) => limit.min(len),
    };
    let mut offset = usize::try_from(pagination.offset).unwrap_or(usize::MAX);
    if offset > len {
        warn!(offset, matches = len, "offset exceeds match count, clamping");
        offset = len;
    }
    let Some(start) = len.checked_sub(offset + 1) else {
        warn!(offset, matches = len, "invalid start index, returning no messages");
        return MessageWindow::new(Vec::new(), total);
    };
    let end = (start + 1).saturating_sub(limit);
    MessageWindow::new(seqs[end..=start].iter().rev().copied().collect(), total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn found(all: Vec<u32>, count: Option<u32>) -> SearchData {
        SearchData {
            all,
            count,
            ..SearchData::default()
        }
    }

    fn page(limit: u32, offset: u32) -> Pagination {
        Pagination {
            limit,
            offset,
            ..Pagination::default()
        }
    }

    fn ready(plan: WindowPlan) -> MessageWindow {
        match plan {
            WindowPlan::Ready(w) => w,
            other => panic!("expected a ready window, got {other:?}"),
        }
    }

    #[test]
    fn newest_first_page() {
        let all: Vec<u32> = (1..=20).collect();
        let w = ready(window(&found(all, Some(20)), &page(5, 3)));
        assert_eq!(w.seqs(), &[17, 16, 15, 14, 13]);
        assert_eq!(w.total(), 20);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let all: Vec<u32> = (1..=20).collect();
        let w = ready(window(&found(all, None), &page(5, 25)));
        assert!(w.is_empty());
        assert_eq!(w.total(), 20);
    }

    #[test]
    fn no_limit_returns_everything_reversed() {
        let w = ready(window(&found(vec![3, 1, 2, 2], None), &page(0, 0)));
        assert_eq!(w.seqs(), &[3, 2, 1]);
        assert_eq!(w.total(), 3);
    }

    #[test]
    fn last_partial_page() {
        let all: Vec<u32> = (1..=7).collect();
        let w = ready(window(&found(all, None), &page(5, 5)));
        assert_eq!(w.seqs(), &[2, 1]);
    }

    #[test]
    fn zero_matches_is_empty() {
        assert_eq!(window(&found(vec![], None), &page(5, 0)), WindowPlan::Empty);
        assert_eq!(window(&found(vec![], Some(0)), &page(5, 0)), WindowPlan::Empty);
    }

    #[test]
    fn count_only_needs_reconstruction() {
        assert_eq!(
            window(&found(vec![], Some(20)), &page(5, 3)),
            WindowPlan::Reconstruct {
                first: 13,
                last: 17,
                total: 20
            }
        );
        assert_eq!(
            window(&found(vec![], Some(4)), &page(10, 0)),
            WindowPlan::Reconstruct {
                first: 1,
                last: 4,
                total: 4
            }
        );
        assert_eq!(
            window(&found(vec![], Some(4)), &page(0, 1)),
            WindowPlan::Reconstruct {
                first: 1,
                last: 3,
                total: 4
            }
        );
    }

    #[test]
    fn count_only_offset_past_end_is_empty() {
        assert_eq!(window(&found(vec![], Some(4)), &page(2, 4)), WindowPlan::Empty);
        assert_eq!(window(&found(vec![], Some(4)), &page(2, 9)), WindowPlan::Empty);
    }

    #[test]
    fn server_count_wins_over_list_length() {
        let w = ready(window(&found(vec![5, 6], Some(40)), &page(0, 0)));
        assert_eq!(w.total(), 40);
        assert_eq!(w.seqs(), &[6, 5]);
    }

    proptest! {
        #[test]
        fn window_is_a_descending_suffix_slice(
            n in 1usize..200,
            limit in 0u32..50,
            offset in 0u32..250,
        ) {
            let all: Vec<u32> = (1..=u32::try_from(n).unwrap()).collect();
            let w = ready(window(&found(all, None), &page(limit, offset)));
            let n32 = u32::try_from(n).unwrap();
            let expected_len = if offset >= n32 {
                0
            } else if limit == 0 {
                n32 - offset
            } else {
                limit.min(n32 - offset)
            };
            prop_assert_eq!(w.len(), expected_len as usize);
            prop_assert!(w.seqs().windows(2).all(|p| p[0] > p[1]));
            if let Some(&first) = w.seqs().first() {
                prop_assert_eq!(first, n32 - offset);
            }
        }
    }
}

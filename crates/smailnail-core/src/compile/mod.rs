//! Predicate compilation into IMAP SEARCH criteria.
//!
//! Compilation is pure: the only outside input is the current time, used by
//! `within_days`, which [`Compiler::new`] takes explicitly.

pub mod date;
pub mod flags;
pub mod size;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use smailnail_imap::{SearchCriteria, SearchOptions, Uid, UidSet};

use crate::error::ValidationError;
use crate::rule::{check_arity, LeafCriteria, Operator, Pagination, SearchPredicate};

use self::date::parse_date;
use self::flags::to_flag;
use self::size::parse_size;

/// A compiled search: criteria plus the ESEARCH return options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSearch {
    /// Search key tree.
    pub criteria: SearchCriteria,
    /// `RETURN (...)` options; empty for a plain SEARCH.
    pub options: SearchOptions,
}

/// Compiles with the current time.
///
/// # Errors
///
/// As [`Compiler::compile`].
pub fn compile(
    predicate: &SearchPredicate,
    pagination: Option<&Pagination>,
) -> Result<CompiledSearch, ValidationError> {
    Compiler::new(Utc::now()).compile(predicate, pagination)
}

/// Predicate compiler anchored at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    now: DateTime<Utc>,
}

impl Compiler {
    /// Creates a compiler that treats `now` as the current time.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Compiles `predicate`, applying `pagination` to the outermost query.
    ///
    /// A positive limit requests `RETURN (ALL COUNT)`; UID bounds become an
    /// exclusive UID range ANDed onto the whole tree.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; nothing partial is produced.
    pub fn compile(
        &self,
        predicate: &SearchPredicate,
        pagination: Option<&Pagination>,
    ) -> Result<CompiledSearch, ValidationError> {
        let mut criteria = self.node(predicate)?;
        let mut options = SearchOptions::default();
        if let Some(pagination) = pagination {
            if pagination.limit > 0 {
                options = SearchOptions::all_and_count();
            }
            if let Some(range) = uid_range(pagination)? {
                criteria = criteria.and(SearchCriteria::Uid(range));
            }
        }
        Ok(CompiledSearch { criteria, options })
    }

    fn node(&self, predicate: &SearchPredicate) -> Result<SearchCriteria, ValidationError> {
        match predicate {
            SearchPredicate::Leaf(leaf) => self.leaf(leaf),
            SearchPredicate::Combinator {
                operator,
                conditions,
            } => {
                check_arity(*operator, conditions.len())?;
                match operator {
                    Operator::And => conditions
                        .iter()
                        .try_fold(SearchCriteria::All, |acc, c| Ok(acc.and(self.node(c)?))),
                    Operator::Or => self.or(conditions),
                    Operator::Not => Ok(SearchCriteria::not(self.node(&conditions[0])?)),
                }
            }
        }
    }

    /// Pairs children two at a time; an odd trailing child is OR-ed with
    /// itself. A single child collapses to itself.
    fn or(&self, conditions: &[SearchPredicate]) -> Result<SearchCriteria, ValidationError> {
        if let [only] = conditions {
            return self.node(only);
        }
        let pairs = conditions
            .chunks(2)
            .map(|pair| {
                let a = self.node(&pair[0])?;
                let b = match pair.get(1) {
                    Some(b) => self.node(b)?,
                    None => a.clone(),
                };
                Ok(SearchCriteria::or(a, b))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        Ok(SearchCriteria::all_of(pairs))
    }

    fn leaf(&self, leaf: &LeafCriteria) -> Result<SearchCriteria, ValidationError> {
        let mut keys = Vec::new();

        if let Some(v) = &leaf.since {
            keys.push(SearchCriteria::Since(parse_date("since", v)?));
        }
        if let Some(v) = &leaf.before {
            keys.push(SearchCriteria::Before(parse_date("before", v)?));
        }
        if let Some(v) = &leaf.on {
            let day = parse_date("on", v)?;
            keys.push(SearchCriteria::Since(day));
            if let Some(next) = day.succ_opt() {
                keys.push(SearchCriteria::Before(next));
            }
        }
        if let Some(days) = leaf.within_days.filter(|&d| d > 0) {
            keys.push(SearchCriteria::Since(self.days_ago(days)));
        }

        let text_keys: [(&Option<String>, fn(String) -> SearchCriteria); 8] = [
            (&leaf.from, SearchCriteria::From),
            (&leaf.to, SearchCriteria::To),
            (&leaf.cc, SearchCriteria::Cc),
            (&leaf.bcc, SearchCriteria::Bcc),
            (&leaf.subject, SearchCriteria::Subject),
            (&leaf.subject_contains, SearchCriteria::Subject),
            (&leaf.body_contains, SearchCriteria::Body),
            (&leaf.text, SearchCriteria::Text),
        ];
        for (value, key) in text_keys {
            if let Some(v) = value {
                keys.push(key(v.clone()));
            }
        }

        if let Some(header) = &leaf.header {
            if header.name.trim().is_empty() {
                return Err(ValidationError::MissingField("header name"));
            }
            keys.push(SearchCriteria::Header(
                header.name.clone(),
                header.value.clone(),
            ));
        }
        if let Some(flags) = &leaf.flags {
            for name in &flags.has {
                keys.push(SearchCriteria::HasFlag(to_flag(name)?));
            }
            for name in &flags.not_has {
                keys.push(SearchCriteria::LacksFlag(to_flag(name)?));
            }
        }
        if let Some(size) = &leaf.size {
            if let Some(v) = &size.larger_than {
                keys.push(SearchCriteria::Larger(parse_size(v)?));
            }
            if let Some(v) = &size.smaller_than {
                keys.push(SearchCriteria::Smaller(parse_size(v)?));
            }
        }

        Ok(SearchCriteria::all_of(keys))
    }

    /// UTC calendar day `days` before `now`.
    fn days_ago(&self, days: u32) -> NaiveDate {
        self.now
            .checked_sub_signed(TimeDelta::days(i64::from(days)))
            .map_or(NaiveDate::MIN, |t| t.date_naive())
    }
}

/// UID bounds as an exclusive range; `None` when neither bound is set.
fn uid_range(pagination: &Pagination) -> Result<Option<UidSet>, ValidationError> {
    let empty = || {
        ValidationError::InvalidOutput(format!(
            "UID bounds after={:?} before={:?} leave no UIDs to match",
            pagination.after_uid, pagination.before_uid
        ))
    };
    let first = match pagination.after_uid {
        Some(after) => Some(after.checked_add(1).and_then(Uid::new).ok_or_else(empty)?),
        None => None,
    };
    let last = match pagination.before_uid {
        Some(before) => Some(before.checked_sub(1).and_then(Uid::new).ok_or_else(empty)?),
        None => None,
    };
    match (first, last) {
        (None, None) => Ok(None),
        (Some(first), None) => Ok(Some(UidSet::RangeFrom(first))),
        (first, Some(last)) => {
            let first = first.or_else(|| Uid::new(1)).ok_or_else(empty)?;
            if first > last {
                return Err(empty());
            }
            Ok(Some(UidSet::range(first, last)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rule::{FlagCriteria, HeaderCriteria, SizeCriteria};
    use chrono::TimeZone;
    use smailnail_imap::Flag;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn compiler() -> Compiler {
        Compiler::new(Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap())
    }

    fn from(addr: &str) -> SearchPredicate {
        SearchPredicate::leaf(LeafCriteria {
            from: Some(addr.into()),
            ..LeafCriteria::default()
        })
    }

    fn criteria(p: &SearchPredicate) -> SearchCriteria {
        compiler().compile(p, None).unwrap().criteria
    }

    #[test]
    fn empty_leaf_matches_all() {
        assert_eq!(criteria(&SearchPredicate::default()), SearchCriteria::All);
    }

    #[test]
    fn leaf_fields_are_anded() {
        let p = SearchPredicate::leaf(LeafCriteria {
            from: Some("alice".into()),
            subject: Some("report".into()),
            header: Some(HeaderCriteria {
                name: "X-Priority".into(),
                value: "1".into(),
            }),
            flags: Some(FlagCriteria {
                has: vec!["flagged".into()],
                not_has: vec!["seen".into()],
            }),
            size: Some(SizeCriteria {
                larger_than: Some("10K".into()),
                smaller_than: None,
            }),
            ..LeafCriteria::default()
        });
        assert_eq!(
            criteria(&p),
            SearchCriteria::And(vec![
                SearchCriteria::From("alice".into()),
                SearchCriteria::Subject("report".into()),
                SearchCriteria::Header("X-Priority".into(), "1".into()),
                SearchCriteria::HasFlag(Flag::Flagged),
                SearchCriteria::LacksFlag(Flag::Seen),
                SearchCriteria::Larger(10_240),
            ])
        );
    }

    #[test]
    fn and_flattens_children() {
        let p = SearchPredicate::and(vec![from("a"), from("b"), from("c")]);
        assert_eq!(
            criteria(&p),
            SearchCriteria::And(vec![
                SearchCriteria::From("a".into()),
                SearchCriteria::From("b".into()),
                SearchCriteria::From("c".into()),
            ])
        );
    }

    #[test]
    fn or_pairs_with_odd_child_self_paired() {
        let p = SearchPredicate::or(vec![from("a"), from("b"), from("c")]);
        let a = SearchCriteria::From("a".into());
        let b = SearchCriteria::From("b".into());
        let c = SearchCriteria::From("c".into());
        assert_eq!(
            criteria(&p),
            SearchCriteria::And(vec![
                SearchCriteria::or(a, b),
                SearchCriteria::or(c.clone(), c),
            ])
        );
    }

    #[test]
    fn or_of_one_collapses() {
        let p = SearchPredicate::or(vec![from("a")]);
        assert_eq!(criteria(&p), SearchCriteria::From("a".into()));
    }

    #[test]
    fn not_arity() {
        let c = compiler();
        assert_eq!(
            c.compile(&SearchPredicate::not(vec![from("a"), from("b")]), None),
            Err(ValidationError::ArityViolation {
                operator: Operator::Not,
                found: 2
            })
        );
        assert_eq!(
            c.compile(&SearchPredicate::not(vec![]), None),
            Err(ValidationError::EmptyConditionList {
                operator: Operator::Not
            })
        );
        assert_eq!(
            criteria(&SearchPredicate::not(vec![from("a")])),
            SearchCriteria::not(SearchCriteria::From("a".into()))
        );
    }

    #[test]
    fn empty_and_or_are_errors() {
        for p in [SearchPredicate::and(vec![]), SearchPredicate::or(vec![])] {
            assert!(matches!(
                compiler().compile(&p, None),
                Err(ValidationError::EmptyConditionList { .. })
            ));
        }
    }

    #[test]
    fn nested_error_aborts() {
        let bad = SearchPredicate::leaf(LeafCriteria {
            size: Some(SizeCriteria {
                larger_than: Some("huge".into()),
                smaller_than: None,
            }),
            ..LeafCriteria::default()
        });
        let p = SearchPredicate::or(vec![from("a"), SearchPredicate::not(vec![bad])]);
        assert!(matches!(
            compiler().compile(&p, None),
            Err(ValidationError::SizeParse { .. })
        ));
    }

    #[test]
    fn on_spans_one_day() {
        let p = SearchPredicate::leaf(LeafCriteria {
            on: Some("2024-02-29".into()),
            ..LeafCriteria::default()
        });
        assert_eq!(
            criteria(&p),
            SearchCriteria::And(vec![
                SearchCriteria::Since(ymd(2024, 2, 29)),
                SearchCriteria::Before(ymd(2024, 3, 1)),
            ])
        );
    }

    #[test]
    fn within_days_counts_back_from_now() {
        let p = SearchPredicate::leaf(LeafCriteria {
            within_days: Some(7),
            ..LeafCriteria::default()
        });
        assert_eq!(criteria(&p), SearchCriteria::Since(ymd(2024, 6, 3)));

        let zero = SearchPredicate::leaf(LeafCriteria {
            within_days: Some(0),
            ..LeafCriteria::default()
        });
        assert_eq!(criteria(&zero), SearchCriteria::All);
    }

    #[test]
    fn within_days_uses_the_utc_day() {
        let p = SearchPredicate::leaf(LeafCriteria {
            within_days: Some(1),
            ..LeafCriteria::default()
        });
        let late = Utc.with_ymd_and_hms(2024, 6, 10, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 6, 11, 0, 30, 0).unwrap();
        assert_eq!(
            Compiler::new(late).compile(&p, None).unwrap().criteria,
            SearchCriteria::Since(ymd(2024, 6, 9))
        );
        assert_eq!(
            Compiler::new(early).compile(&p, None).unwrap().criteria,
            SearchCriteria::Since(ymd(2024, 6, 10))
        );
    }

    #[test]
    fn limit_requests_all_and_count() {
        let pagination = Pagination {
            limit: 10,
            ..Pagination::default()
        };
        let compiled = compiler()
            .compile(&from("a"), Some(&pagination))
            .unwrap();
        assert_eq!(compiled.options, SearchOptions::all_and_count());

        let unlimited = compiler()
            .compile(&from("a"), Some(&Pagination::default()))
            .unwrap();
        assert!(unlimited.options.is_empty());
    }

    #[test]
    fn uid_bounds_are_exclusive() {
        let uid = |n| Uid::new(n).unwrap();
        let range = |after, before| {
            let p = Pagination {
                after_uid: after,
                before_uid: before,
                ..Pagination::default()
            };
            compiler()
                .compile(&SearchPredicate::default(), Some(&p))
                .map(|c| c.criteria)
        };
        assert_eq!(
            range(Some(10), Some(20)).unwrap(),
            SearchCriteria::Uid(UidSet::range(uid(11), uid(19)))
        );
        assert_eq!(
            range(Some(10), None).unwrap(),
            SearchCriteria::Uid(UidSet::RangeFrom(uid(11)))
        );
        assert_eq!(
            range(None, Some(20)).unwrap(),
            SearchCriteria::Uid(UidSet::range(uid(1), uid(19)))
        );
        assert!(range(Some(10), Some(11)).is_err());
        assert!(range(None, Some(1)).is_err());
        assert!(range(Some(u32::MAX), None).is_err());
    }

    #[test]
    fn uid_range_wraps_the_whole_tree() {
        let p = Pagination {
            after_uid: Some(5),
            ..Pagination::default()
        };
        let tree = SearchPredicate::or(vec![from("a"), from("b")]);
        let compiled = compiler().compile(&tree, Some(&p)).unwrap();
        assert_eq!(
            compiled.criteria,
            SearchCriteria::And(vec![
                SearchCriteria::or(
                    SearchCriteria::From("a".into()),
                    SearchCriteria::From("b".into())
                ),
                SearchCriteria::Uid(UidSet::RangeFrom(Uid::new(6).unwrap())),
            ])
        );
    }
}

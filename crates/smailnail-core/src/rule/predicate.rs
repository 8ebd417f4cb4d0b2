//! Search predicates: a leaf of field conditions or a boolean combinator.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ValidationError;

/// Boolean combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// All children match.
    And,
    /// Children are OR-ed pairwise.
    Or,
    /// The single child does not match.
    Not,
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "not" => Ok(Self::Not),
            _ => Err(ValidationError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        })
    }
}

/// A node of the search tree.
///
/// In YAML a node is either a map of leaf fields or a map with `operator`
/// and `conditions`; a map carrying both is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPredicate")]
pub enum SearchPredicate {
    /// Field conditions, all of which must hold.
    Leaf(Box<LeafCriteria>),
    /// A boolean combination of child predicates.
    Combinator {
        /// How the children combine.
        operator: Operator,
        /// Child predicates.
        conditions: Vec<SearchPredicate>,
    },
}

impl Default for SearchPredicate {
    fn default() -> Self {
        Self::Leaf(Box::default())
    }
}

impl SearchPredicate {
    /// Wraps leaf criteria.
    #[must_use]
    pub fn leaf(criteria: LeafCriteria) -> Self {
        Self::Leaf(Box::new(criteria))
    }

    /// `and` over `conditions`.
    #[must_use]
    pub const fn and(conditions: Vec<Self>) -> Self {
        Self::Combinator {
            operator: Operator::And,
            conditions,
        }
    }

    /// `or` over `conditions`.
    #[must_use]
    pub const fn or(conditions: Vec<Self>) -> Self {
        Self::Combinator {
            operator: Operator::Or,
            conditions,
        }
    }

    /// `not` over `conditions`; exactly one is valid.
    #[must_use]
    pub const fn not(conditions: Vec<Self>) -> Self {
        Self::Combinator {
            operator: Operator::Not,
            conditions,
        }
    }
}

/// Leaf search fields. Unset fields do not constrain the search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LeafCriteria {
    /// Internal date on or after this day.
    pub since: Option<String>,
    /// Internal date before this day.
    pub before: Option<String>,
    /// Internal date within this day.
    pub on: Option<String>,
    /// Internal date within the last N days.
    pub within_days: Option<u32>,
    /// From header contains.
    pub from: Option<String>,
    /// To header contains.
    pub to: Option<String>,
    /// Cc header contains.
    pub cc: Option<String>,
    /// Bcc header contains.
    pub bcc: Option<String>,
    /// Subject contains.
    pub subject: Option<String>,
    /// Subject contains (alias kept for rule files that use it).
    pub subject_contains: Option<String>,
    /// Arbitrary header contains.
    pub header: Option<HeaderCriteria>,
    /// Body contains.
    pub body_contains: Option<String>,
    /// Headers or body contain.
    pub text: Option<String>,
    /// Flag presence.
    pub flags: Option<FlagCriteria>,
    /// Size bounds.
    pub size: Option<SizeCriteria>,
}

impl LeafCriteria {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `header: {name, value}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderCriteria {
    /// Header field name.
    pub name: String,
    /// Substring to look for.
    pub value: String,
}

/// `flags: {has: [...], not_has: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagCriteria {
    /// Flags that must be set.
    pub has: Vec<String>,
    /// Flags that must not be set.
    pub not_has: Vec<String>,
}

/// `size: {larger_than, smaller_than}` with `B`/`K`/`M`/`G` suffixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SizeCriteria {
    /// Strict lower bound.
    pub larger_than: Option<String>,
    /// Strict upper bound.
    pub smaller_than: Option<String>,
}

#[derive(Deserialize)]
struct RawPredicate {
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    conditions: Option<Vec<SearchPredicate>>,
    #[serde(flatten)]
    leaf: LeafCriteria,
}

impl TryFrom<RawPredicate> for SearchPredicate {
    type Error = ValidationError;

    fn try_from(raw: RawPredicate) -> Result<Self, Self::Error> {
        match raw.operator {
            Some(op) => {
                let operator = op.parse()?;
                if !raw.leaf.is_empty() {
                    return Err(ValidationError::MixedNode);
                }
                Ok(Self::Combinator {
                    operator,
                    conditions: raw.conditions.unwrap_or_default(),
                })
            }
            None if raw.conditions.is_some() => Err(ValidationError::MissingField("operator")),
            None => Ok(Self::Leaf(Box::new(raw.leaf))),
        }
    }
}

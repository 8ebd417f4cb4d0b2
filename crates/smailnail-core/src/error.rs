//! Error types for rule processing.

use std::fmt;

use thiserror::Error;

use crate::rule::Operator;

/// A rule that cannot be compiled or executed as written.
///
/// Raised before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A combinator with no children.
    #[error("empty conditions list for {operator} operator")]
    EmptyConditionList {
        /// The combinator.
        operator: Operator,
    },
    /// NOT with more than one child.
    #[error("operator '{operator}' takes exactly one condition, but {found} were provided")]
    ArityViolation {
        /// The combinator.
        operator: Operator,
        /// Number of children given.
        found: usize,
    },
    /// Operator other than and/or/not.
    #[error("invalid operator: {0} (must be 'and', 'or', or 'not')")]
    UnknownOperator(String),
    /// Date string in no supported format.
    #[error("invalid '{field}' date: could not parse {value:?}")]
    DateParse {
        /// Predicate field (`since`, `before`, `on`).
        field: &'static str,
        /// Raw value.
        value: String,
    },
    /// Size string not matching `<digits>[BKMG]`.
    #[error("invalid size format: {value:?} (expected 100B, 10K, 5M, 1G)")]
    SizeParse {
        /// Raw value.
        value: String,
    },
    /// Flag name that cannot be sent as a keyword.
    #[error("invalid flag: {0:?}")]
    InvalidFlag(String),
    /// A node mixing leaf fields with `operator`/`conditions`.
    #[error("a condition cannot combine an operator with search fields")]
    MixedNode,
    /// A required field is absent or empty.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// Output block problem.
    #[error("invalid output config: {0}")]
    InvalidOutput(String),
    /// Action block problem.
    #[error("invalid actions config: {0}")]
    InvalidAction(String),
}

/// Pipeline step a protocol failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Predicate compilation.
    BuildCriteria,
    /// SEARCH round trip.
    Search,
    /// Structure fetch (phase 1).
    FetchMessages,
    /// UID-only fetch rebuilding a count-only result.
    FetchUids,
    /// Batched section fetch (phase 2).
    FetchContent,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BuildCriteria => "failed to build search criteria",
            Self::Search => "failed to execute search",
            Self::FetchMessages => "failed to fetch messages",
            Self::FetchUids => "failed to fetch message UIDs",
            Self::FetchContent => "failed to fetch message content",
        })
    }
}

/// Errors from loading, running or generating with rules.
#[derive(Debug, Error)]
pub enum Error {
    /// Rule or template failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A pipeline step failed.
    #[error("{stage}: {source}")]
    Stage {
        /// Where it failed.
        stage: Stage,
        /// Underlying failure.
        #[source]
        source: Box<Self>,
    },

    /// An action failed.
    #[error("{action} action failed: {source}")]
    Action {
        /// Action name (`flags`, `copy`, `move`, `delete`, `export`).
        action: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<Self>,
    },

    /// IMAP failure.
    #[error("IMAP error: {0}")]
    Imap(#[from] smailnail_imap::Error),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template rendering failure.
    #[error("template error: {0}")]
    Template(String),
}

impl Error {
    /// Wraps `source` with the pipeline stage it happened in.
    pub fn at(stage: Stage, source: impl Into<Self>) -> Self {
        Self::Stage {
            stage,
            source: Box::new(source.into()),
        }
    }

    /// Wraps `source` with the action that failed.
    pub fn in_action(action: &'static str, source: impl Into<Self>) -> Self {
        Self::Action {
            action,
            source: Box::new(source.into()),
        }
    }

    /// Stage of the outermost stage wrapper, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The validation error underneath any wrappers.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Stage { source, .. } | Self::Action { source, .. } => source.validation(),
            _ => None,
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

//! Rule files: a named search, an output projection and optional actions.

mod actions;
mod output;
mod predicate;
mod validation;

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

pub use actions::{ActionConfig, DeleteConfig, ExportConfig, ExportFormat, FlagActions};
pub use output::{
    ContentField, ContentMode, OutputConfig, OutputField, OutputFormat, Pagination,
};
pub use predicate::{
    FlagCriteria, HeaderCriteria, LeafCriteria, Operator, SearchPredicate, SizeCriteria,
};
pub(crate) use validation::check_arity;

/// A parsed rule file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    /// Rule name, used in logs.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Search tree; an absent block matches every message.
    #[serde(default)]
    pub search: SearchPredicate,
    /// What to render.
    #[serde(default)]
    pub output: OutputConfig,
    /// What to do with the matches.
    #[serde(default)]
    pub actions: Option<ActionConfig>,
}

/// Parses and validates a rule from YAML.
///
/// # Errors
///
/// Returns a YAML error for malformed input and a validation error for a
/// rule that cannot run.
pub fn parse_rule(yaml: &str) -> Result<Rule> {
    let rule: Rule = serde_yaml::from_str(yaml)?;
    rule.validate()?;
    Ok(rule)
}

/// Reads, parses and validates a rule file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, otherwise as
/// [`parse_rule`].
pub fn load_rule(path: impl AsRef<Path>) -> Result<Rule> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_rule(&text)
}

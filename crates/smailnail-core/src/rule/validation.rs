//! Rule validation, run once after parsing and before any network traffic.

use crate::compile::{date::parse_date, flags::is_valid_flag, size::parse_size};
use crate::error::ValidationError;

use super::actions::ActionConfig;
use super::output::{ContentMode, OutputConfig, OutputField};
use super::predicate::{LeafCriteria, Operator, SearchPredicate};
use super::Rule;

type Result<T> = std::result::Result<T, ValidationError>;

impl Rule {
    /// Checks the name, the predicate tree, the output block and the actions.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("rule name"));
        }
        self.search.validate()?;
        self.output.validate()?;
        if let Some(actions) = &self.actions {
            actions.validate()?;
        }
        Ok(())
    }
}

impl SearchPredicate {
    /// Checks combinator arity and every leaf value, recursively.
    ///
    /// # Errors
    ///
    /// Returns the first invalid node.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Leaf(leaf) => leaf.validate(),
            Self::Combinator {
                operator,
                conditions,
            } => {
                check_arity(*operator, conditions.len())?;
                conditions.iter().try_for_each(Self::validate)
            }
        }
    }
}

/// Combinators need children; `not` takes exactly one.
pub(crate) const fn check_arity(operator: Operator, found: usize) -> Result<()> {
    if found == 0 {
        return Err(ValidationError::EmptyConditionList { operator });
    }
    if matches!(operator, Operator::Not) && found > 1 {
        return Err(ValidationError::ArityViolation { operator, found });
    }
    Ok(())
}

impl LeafCriteria {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("since", &self.since),
            ("before", &self.before),
            ("on", &self.on),
        ] {
            if let Some(value) = value {
                parse_date(field, value)?;
            }
        }
        if let Some(header) = &self.header {
            if header.name.trim().is_empty() {
                return Err(ValidationError::MissingField("header name"));
            }
        }
        if let Some(flags) = &self.flags {
            if let Some(bad) = flags
                .has
                .iter()
                .chain(&flags.not_has)
                .find(|f| !is_valid_flag(f))
            {
                return Err(ValidationError::InvalidFlag(bad.clone()));
            }
        }
        if let Some(size) = &self.size {
            for value in [&size.larger_than, &size.smaller_than].into_iter().flatten() {
                parse_size(value)?;
            }
        }
        Ok(())
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(ValidationError::InvalidOutput(
                "at least one field is required".into(),
            ));
        }
        for field in &self.fields {
            if let OutputField::MimeParts(content) = field {
                if content.mode == ContentMode::Filter && content.types.is_empty() {
                    return Err(ValidationError::InvalidOutput(
                        "mime_parts filter mode requires a non-empty types list".into(),
                    ));
                }
            }
        }
        if let (Some(after), Some(before)) = (
            self.pagination().after_uid,
            self.pagination().before_uid,
        ) {
            if after.saturating_add(1) >= before {
                return Err(ValidationError::InvalidOutput(format!(
                    "after_uid {after} and before_uid {before} leave no UIDs to match"
                )));
            }
        }
        Ok(())
    }
}

impl ActionConfig {
    fn validate(&self) -> Result<()> {
        if let Some(flags) = &self.flags {
            if flags.is_empty() {
                return Err(ValidationError::InvalidAction(
                    "flags action must add or remove at least one flag".into(),
                ));
            }
            if let Some(bad) = flags
                .add
                .iter()
                .chain(&flags.remove)
                .find(|f| !is_valid_flag(f))
            {
                return Err(ValidationError::InvalidFlag(bad.clone()));
            }
        }
        for (what, target) in [("move_to", &self.move_to), ("copy_to", &self.copy_to)] {
            if target.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err(ValidationError::InvalidAction(format!(
                    "{what} requires a mailbox name"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rule::parse_rule;

    const HEADER: &str = "name: test\noutput:\n  fields: [subject]\n";

    fn err(yaml: &str) -> ValidationError {
        match parse_rule(yaml).unwrap_err() {
            crate::Error::Validation(e) => e,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn accepts_a_complete_rule() {
        let rule = parse_rule(
            "name: invoices\nsearch:\n  operator: or\n  conditions:\n    - subject: invoice\n    - from: billing@example.com\noutput:\n  format: json\n  limit: 5\n  fields: [uid, subject]\nactions:\n  flags:\n    add: [seen, $Processed]\n",
        )
        .unwrap();
        assert_eq!(rule.name, "invoices");
    }

    #[test]
    fn name_is_required() {
        assert_eq!(
            err("name: ''\noutput:\n  fields: [uid]\n"),
            ValidationError::MissingField("rule name")
        );
    }

    #[test]
    fn not_arity_and_empty_lists() {
        assert_eq!(
            err(&format!(
                "{HEADER}search:\n  operator: not\n  conditions: [{{from: a}}, {{from: b}}]\n"
            )),
            ValidationError::ArityViolation {
                operator: Operator::Not,
                found: 2
            }
        );
        assert_eq!(
            err(&format!("{HEADER}search:\n  operator: and\n  conditions: []\n")),
            ValidationError::EmptyConditionList {
                operator: Operator::And
            }
        );
    }

    #[test]
    fn nested_leaf_values_are_checked() {
        let e = err(&format!(
            "{HEADER}search:\n  operator: and\n  conditions:\n    - size: {{larger_than: 10X}}\n"
        ));
        assert!(matches!(e, ValidationError::SizeParse { .. }));

        let e = err(&format!("{HEADER}search:\n  since: yesterday-ish\n"));
        assert!(matches!(e, ValidationError::DateParse { field: "since", .. }));

        let e = err(&format!("{HEADER}search:\n  flags: {{has: ['bad flag']}}\n"));
        assert_eq!(e, ValidationError::InvalidFlag("bad flag".into()));

        let e = err(&format!("{HEADER}search:\n  header: {{name: '', value: x}}\n"));
        assert_eq!(e, ValidationError::MissingField("header name"));
    }

    #[test]
    fn output_checks() {
        assert!(matches!(
            err("name: t\noutput:\n  format: json\n"),
            ValidationError::InvalidOutput(_)
        ));
        assert!(matches!(
            err("name: t\noutput:\n  fields:\n    - mime_parts: {mode: filter}\n"),
            ValidationError::InvalidOutput(_)
        ));
        assert!(matches!(
            err("name: t\noutput:\n  after_uid: 10\n  before_uid: 11\n  fields: [uid]\n"),
            ValidationError::InvalidOutput(_)
        ));
    }

    #[test]
    fn action_checks() {
        assert!(matches!(
            err(&format!("{HEADER}actions:\n  move_to: ' '\n")),
            ValidationError::InvalidAction(_)
        ));
        assert!(matches!(
            err(&format!("{HEADER}actions:\n  flags: {{add: []}}\n")),
            ValidationError::InvalidAction(_)
        ));
    }
}

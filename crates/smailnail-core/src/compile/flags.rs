//! Flag names as written in rule files.

use smailnail_imap::Flag;

use crate::error::ValidationError;

const STANDARD: [&str; 7] = [
    "seen", "answered", "flagged", "deleted", "draft", "recent", "important",
];

/// Maps a friendly flag name to its wire form.
///
/// Names already starting with `\` or `$` pass through; the standard names
/// map to their system flags (`important` to `$Important`); anything else is
/// a custom keyword kept verbatim.
#[must_use]
pub fn normalize_flag(name: &str) -> String {
    if name.starts_with('\\') || name.starts_with('$') {
        return name.to_string();
    }
    match name.to_ascii_lowercase().as_str() {
        "seen" => "\\Seen".into(),
        "answered" => "\\Answered".into(),
        "flagged" => "\\Flagged".into(),
        "deleted" => "\\Deleted".into(),
        "draft" => "\\Draft".into(),
        "recent" => "\\Recent".into(),
        "important" => "$Important".into(),
        _ => name.to_string(),
    }
}

/// True if `name` can be sent as a flag.
#[must_use]
pub fn is_valid_flag(name: &str) -> bool {
    if STANDARD.iter().any(|s| s.eq_ignore_ascii_case(name)) {
        return true;
    }
    if let Some(rest) = name.strip_prefix('\\').or_else(|| name.strip_prefix('$')) {
        return !rest.is_empty()
            && !rest
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || "(){}\"\\%*]".contains(c));
    }
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Validates and normalizes `name` into a [`Flag`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFlag`] if the name is not valid.
pub fn to_flag(name: &str) -> Result<Flag, ValidationError> {
    if !is_valid_flag(name) {
        return Err(ValidationError::InvalidFlag(name.to_string()));
    }
    Ok(Flag::parse(&normalize_flag(name)))
}

//! Size strings: digits with an optional `B`, `K`, `M` or `G` suffix.

use crate::error::ValidationError;

/// Parses `value` into bytes. Suffixes are binary multiples and
/// case-sensitive.
///
/// # Errors
///
/// Returns [`ValidationError::SizeParse`] for anything else, including
/// values that overflow `u64`.
pub fn parse_size(value: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::SizeParse {
        value: value.to_string(),
    };
    let (digits, multiplier) = match value.as_bytes().last() {
        Some(b'B') => (&value[..value.len() - 1], 1),
        Some(b'K') => (&value[..value.len() - 1], 1 << 10),
        Some(b'M') => (&value[..value.len() - 1], 1 << 20),
        Some(b'G') => (&value[..value.len() - 1], 1 << 30),
        _ => (value, 1),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

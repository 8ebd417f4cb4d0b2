//! Date strings accepted by `since`, `before` and `on`.

use chrono::{DateTime, NaiveDate};

use crate::error::ValidationError;

/// Calendar-date layouts, tried after RFC 3339 and before RFC 2822.
const LAYOUTS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// Parses `value` into the calendar date it names, in its own offset.
///
/// Formats are tried in order and the first success wins, so `01/02/2024`
/// is January 2nd.
///
/// # Errors
///
/// Returns [`ValidationError::DateParse`] naming `field` when no format
/// matches.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Some(date) = LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(trimmed, layout).ok())
    {
        return Ok(date);
    }
    DateTime::parse_from_rfc2822(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::DateParse {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn every_layout() {
        let expected = ymd(2024, 3, 15);
        for input in [
            "2024-03-15T10:30:00Z",
            "2024-03-15T23:59:59-08:00",
            "2024-03-15",
            "2024/03/15",
            "03/15/2024",
            "15/03/2024",
            "Mar 15, 2024",
            "15 Mar 2024",
            "Fri, 15 Mar 2024 10:30:00 +0000",
            "Fri, 15 Mar 2024 10:30:00 GMT",
        ] {
            assert_eq!(parse_date("since", input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn ambiguous_numeric_prefers_month_first() {
        assert_eq!(parse_date("on", "01/02/2024").unwrap(), ymd(2024, 1, 2));
    }

    #[test]
    fn offset_keeps_local_calendar_day() {
        assert_eq!(
            parse_date("on", "2024-03-15T01:00:00+09:00").unwrap(),
            ymd(2024, 3, 15)
        );
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_date("before", "next tuesday").unwrap_err();
        assert_eq!(
            err,
            ValidationError::DateParse {
                field: "before",
                value: "next tuesday".into()
            }
        );
        assert!(parse_date("since", "2024-13-01").is_err());
    }

    proptest! {
        #[test]
        fn all_layouts_agree(days in 0i64..40_000) {
            let date = ymd(1970, 1, 1) + chrono::Duration::days(days);
            let forms = [
                date.format("%Y-%m-%dT12:00:00Z").to_string(),
                date.format("%Y-%m-%d").to_string(),
                date.format("%Y/%m/%d").to_string(),
                date.format("%m/%d/%Y").to_string(),
                date.format("%b %d, %Y").to_string(),
                date.format("%d %b %Y").to_string(),
                date.format("%a, %d %b %Y 08:00:00 +0000").to_string(),
            ];
            for form in forms {
                prop_assert_eq!(parse_date("on", &form).unwrap(), date);
            }
        }
    }
}

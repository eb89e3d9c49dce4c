//! Helpers shared by the built-in clause processors.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;

use crate::dsl;
use crate::error::{QueryError, QueryResult};

static HAS_WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[*?\\"]"#).expect("valid wildcard pattern"));

static TERM_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"( OR |\s+)").expect("valid separator pattern"));

static FILESIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d)?)\s*(K|M|G|T)B\s*$").expect("valid filesize pattern")
});

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Surrounds each term of a query string with `*` wildcards.
///
/// Input that already uses query-string syntax (`*`, `?`, `\` or `"`) is
/// returned unchanged. Otherwise the input is split on whitespace and on
/// ` OR `, blank parts are dropped, and the rest are rejoined with single
/// spaces.
///
/// ```
/// use cyverse_querydsl::clauses::utils::add_implicit_wildcard;
///
/// assert_eq!(add_implicit_wildcard("foo bar"), "*foo* *bar*");
/// assert_eq!(add_implicit_wildcard("foo OR bar"), "*foo* *bar*");
/// assert_eq!(add_implicit_wildcard("fo?"), "fo?");
/// ```
pub fn add_implicit_wildcard(input: &str) -> String {
    if HAS_WILDCARD.is_match(input) {
        return input.to_string();
    }

    TERM_SEPARATOR
        .split(input)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| format!("*{}*", part))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Appends `#*` to user names that are not zone-qualified.
pub fn add_implicit_username_wildcard(input: &str) -> String {
    if input.contains('#') {
        input.to_string()
    } else {
        format!("{}#*", input)
    }
}

/// Parses a date into milliseconds since the Unix epoch.
///
/// Accepts an integer literal (already milliseconds),
/// `YYYY-MM-DDTHH:MM:SS.mmm<TZ>` where TZ is `Z` or `±hh:mm`, or a bare
/// `YYYY-MM-DD` taken as UTC midnight.
pub fn date_to_epoch_ms(clause_type: &str, date: &str) -> QueryResult<i64> {
    if let Ok(ms) = date.parse::<i64>() {
        return Ok(ms);
    }

    let normalized = match date.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => date.to_string(),
    };
    if let Ok(parsed) = DateTime::parse_from_str(&normalized, DATETIME_FORMAT) {
        return Ok(parsed.timestamp_millis());
    }

    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .ok_or_else(|| {
            QueryError::validation(
                clause_type,
                format!("provided string \"{}\" does not describe a date", date),
            )
        })
}

/// Parses a file size into bytes.
///
/// Accepts an integer literal (bytes) or a number with at most one decimal
/// digit followed by `KB`, `MB`, `GB` or `TB`, all powers of 1024. Fractional
/// results are truncated.
pub fn string_to_filesize(clause_type: &str, filesize: &str) -> QueryResult<i64> {
    if let Ok(bytes) = filesize.parse::<i64>() {
        return Ok(bytes);
    }

    let not_a_size = || {
        QueryError::validation(
            clause_type,
            format!("provided string \"{}\" does not describe a filesize", filesize),
        )
    };

    let caps = FILESIZE.captures(filesize).ok_or_else(not_a_size)?;
    let number: f64 = caps[1].parse().map_err(|_| not_a_size())?;
    let exponent = match &caps[2] {
        "K" => 1,
        "M" => 2,
        "G" => 3,
        "T" => 4,
        _ => return Err(not_a_size()),
    };

    Ok((1024f64.powi(exponent) * number) as i64)
}

/// Builds an inclusive range on `field`, emitting only the bounds given.
pub fn range_query(field: &str, lower: Option<i64>, upper: Option<i64>) -> Value {
    dsl::range(field, lower, upper)
}

/// Applies `parse` to each non-blank bound, failing when both are blank.
pub(crate) fn parse_bounds<F>(
    clause_type: &str,
    from: &str,
    to: &str,
    parse: F,
) -> QueryResult<(Option<i64>, Option<i64>)>
where
    F: Fn(&str, &str) -> QueryResult<i64>,
{
    if from.is_empty() && to.is_empty() {
        return Err(QueryError::validation(
            clause_type,
            "neither from nor to was passed, cannot create clause",
        ));
    }

    let lower = if from.is_empty() {
        None
    } else {
        Some(parse(clause_type, from)?)
    };
    let upper = if to.is_empty() {
        None
    } else {
        Some(parse(clause_type, to)?)
    };
    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wildcard_splits_terms() {
        assert_eq!(add_implicit_wildcard("foo"), "*foo*");
        assert_eq!(add_implicit_wildcard("  foo   bar "), "*foo* *bar*");
        assert_eq!(add_implicit_wildcard("foo OR bar baz"), "*foo* *bar* *baz*");
    }

    #[test]
    fn test_wildcard_keeps_query_syntax() {
        for input in ["foo*", "f?o", r"foo\ bar", "\"foo bar\""] {
            assert_eq!(add_implicit_wildcard(input), input);
        }
    }

    #[test]
    fn test_wildcard_blank_input() {
        assert_eq!(add_implicit_wildcard(""), "");
        assert_eq!(add_implicit_wildcard("   "), "");
    }

    #[test]
    fn test_username_wildcard() {
        assert_eq!(add_implicit_username_wildcard("ipcdev"), "ipcdev#*");
        assert_eq!(add_implicit_username_wildcard("ipcdev#iplant"), "ipcdev#iplant");
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(date_to_epoch_ms("created", "1500000000000").unwrap(), 1_500_000_000_000);
        assert_eq!(date_to_epoch_ms("created", "1970-01-02").unwrap(), 86_400_000);
        assert_eq!(
            date_to_epoch_ms("created", "1970-01-01T00:00:01.500Z").unwrap(),
            1_500
        );
        assert_eq!(
            date_to_epoch_ms("created", "1970-01-01T01:00:00.000+01:00").unwrap(),
            0
        );
    }

    #[test]
    fn test_date_rejects_garbage() {
        let err = date_to_epoch_ms("created", "last tuesday").unwrap_err();
        assert!(matches!(err, QueryError::Validation { .. }));
    }

    #[test]
    fn test_filesize_units() {
        assert_eq!(string_to_filesize("size", "1024").unwrap(), 1024);
        assert_eq!(string_to_filesize("size", "1KB").unwrap(), 1024);
        assert_eq!(string_to_filesize("size", " 1.5 MB ").unwrap(), 1_572_864);
        assert_eq!(string_to_filesize("size", "2MB").unwrap(), 2_097_152);
        assert_eq!(string_to_filesize("size", "1.5GB").unwrap(), 1_610_612_736);
        assert_eq!(string_to_filesize("size", "2GB").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(string_to_filesize("size", "1TB").unwrap(), 1_099_511_627_776);
    }

    #[test]
    fn test_filesize_rejects_unknown_units() {
        assert!(string_to_filesize("size", "1PB").is_err());
        assert!(string_to_filesize("size", "1.25KB").is_err());
        assert!(string_to_filesize("size", "lots").is_err());
    }

    #[test]
    fn test_parse_bounds_requires_one() {
        let err = parse_bounds("size", "", "", string_to_filesize).unwrap_err();
        assert!(err.to_string().contains("neither from nor to"));

        let (lower, upper) = parse_bounds("size", "", "1KB", string_to_filesize).unwrap();
        assert_eq!(lower, None);
        assert_eq!(upper, Some(1024));
    }

    #[test]
    fn test_range_query_delegates() {
        assert_eq!(
            range_query("dateCreated", Some(1), Some(2)),
            json!({"range": {"dateCreated": {"gte": 1, "lte": 2}}})
        );
    }
}

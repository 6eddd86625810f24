//! Lenient scalar parsing for raw CSV text.
//!
//! A value that does not parse is treated as absent; the caller substitutes
//! the sentinel for that property.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Sentinel written for absent dates.
pub const MIN_DATE: &str = "0001-01-01T00:00:00Z";

fn trimmed(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub fn parse_i64(raw: Option<&str>) -> Option<i64> {
    let text = trimmed(raw)?;
    text.parse::<i64>().ok().or_else(|| {
        // "1200000.0" style integers
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

pub fn parse_f64(raw: Option<&str>) -> Option<f64> {
    trimmed(raw)?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `true`/`false` in any case.
pub fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match trimmed(raw)?.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parses `YYYY-MM-DD` (or a full RFC 3339 timestamp) to an RFC 3339 UTC string.
pub fn parse_date(raw: Option<&str>) -> Option<String> {
    let text = trimmed(raw)?;
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let midnight: NaiveDateTime = date.and_hms_opt(0, 0, 0)?;
        return Some(format_utc(midnight.and_utc()));
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| format_utc(dt.with_timezone(&Utc)))
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Returns the trimmed text, or `None` when blank.
pub fn text(raw: Option<&str>) -> Option<String> {
    trimmed(raw).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_i64_variants() {
        assert_eq!(parse_i64(Some("30000000")), Some(30_000_000));
        assert_eq!(parse_i64(Some(" 42 ")), Some(42));
        assert_eq!(parse_i64(Some("1200.0")), Some(1200));
        assert_eq!(parse_i64(Some("1200.5")), None);
        assert_eq!(parse_i64(Some("/zV8bHuSL6WXoD6FWogP9j4x80bL.jpg")), None);
        assert_eq!(parse_i64(Some("")), None);
        assert_eq!(parse_i64(None), None);
    }

    #[test]
    fn test_parse_f64_rejects_garbage() {
        assert_eq!(parse_f64(Some("21.946943")), Some(21.946943));
        assert_eq!(parse_f64(Some("NaN")), None);
        assert_eq!(parse_f64(Some("abc")), None);
    }

    #[test]
    fn test_parse_bool_python_style() {
        assert_eq!(parse_bool(Some("False")), Some(false));
        assert_eq!(parse_bool(Some("TRUE")), Some(true));
        assert_eq!(parse_bool(Some(" - Written by Ørnås")), None);
        assert_eq!(parse_bool(None), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("1995-10-30")),
            Some("1995-10-30T00:00:00Z".to_string())
        );
        assert_eq!(
            parse_date(Some("2001-02-03T04:05:06+01:00")),
            Some("2001-02-03T03:05:06Z".to_string())
        );
        assert_eq!(parse_date(Some("1")), None);
        assert_eq!(parse_date(None), None);
    }
}

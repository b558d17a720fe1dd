//! Freshness-timestamp parsing for object datasets.
//!
//! Object collections carry a per-row "last updated" value that the
//! freshness-scan policy compares against the output's high-water
//! mark. In practice the column arrives in one of two shapes: an
//! RFC3339/ISO-8601 string or a numeric unix timestamp (seconds,
//! milliseconds, or microseconds, detected by digit count).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// UTC timestamp used for freshness comparisons.
pub type Timestamp = DateTime<Utc>;

/// Errors that can occur during timestamp parsing.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// The timestamp string is empty.
    #[error("Empty timestamp string")]
    EmptyString,

    /// The timestamp value is invalid.
    #[error("Invalid timestamp: {0}")]
    InvalidFormat(String),

    /// Nanosecond precision is not supported.
    #[error("Nanosecond precision timestamps are not supported")]
    NanosecondPrecision,
}

/// Parses a freshness cell tolerantly.
///
/// Returns `None` for absent, null, empty, or unparseable values;
/// rows without a usable freshness value never advance the high-water
/// mark and are only eligible through the other predicate terms.
#[must_use]
pub fn parse_freshness(value: &serde_json::Value) -> Option<Timestamp> {
    match value {
        serde_json::Value::String(s) => parse_timestamp(s).ok(),
        serde_json::Value::Number(n) => {
            let num = n.as_f64()?;
            parse_unix_timestamp(num).ok()
        }
        _ => None,
    }
}

/// Parses a timestamp from a string.
///
/// Supports unix timestamps (seconds, milliseconds, microseconds) and
/// RFC3339/ISO-8601 strings with or without timezone.
///
/// # Errors
///
/// Returns `TimestampError` if the input cannot be parsed.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, TimestampError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(TimestampError::EmptyString);
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        return parse_unix_timestamp(num);
    }

    parse_iso8601(trimmed)
}

/// Parses a unix timestamp with precision detected by digit count:
/// up to 10 digits is seconds, up to 13 milliseconds, up to 16
/// microseconds.
///
/// # Errors
///
/// Returns `TimestampError::NanosecondPrecision` beyond 16 digits, or
/// `InvalidFormat` if the value is out of range.
pub fn parse_unix_timestamp(value: f64) -> Result<Timestamp, TimestampError> {
    let has_fraction = (value - value.trunc()).abs() > f64::EPSILON;

    if has_fraction {
        let secs = value.trunc() as i64;
        let nanos = (value.fract().abs() * 1_000_000_000.0) as u32;
        return Utc
            .timestamp_opt(secs, nanos)
            .single()
            .ok_or_else(|| TimestampError::InvalidFormat(value.to_string()));
    }

    let int_part = value.trunc() as i64;
    let digit_count = if int_part == 0 {
        1
    } else {
        int_part.abs().to_string().len()
    };

    let (secs, nanos) = match digit_count {
        0..=10 => (int_part, 0u32),
        11..=13 => (int_part / 1000, ((int_part % 1000) * 1_000_000) as u32),
        14..=16 => (int_part / 1_000_000, ((int_part % 1_000_000) * 1000) as u32),
        _ => return Err(TimestampError::NanosecondPrecision),
    };

    Utc.timestamp_opt(secs, nanos)
        .single()
        .ok_or_else(|| TimestampError::InvalidFormat(value.to_string()))
}

fn parse_iso8601(s: &str) -> Result<Timestamp, TimestampError> {
    let normalized = s.replace('Z', "+00:00");

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    for fmt in formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(naive_date) = chrono::NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        if let Some(naive_dt) = naive_date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive_dt));
        }
    }

    Err(TimestampError::InvalidFormat(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_timestamp("2024-03-05T14:30:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 5);
    }

    #[test]
    fn test_parse_naive_datetime() {
        let dt = parse_timestamp("2024-03-05 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_timestamp("2024-03-05").unwrap();
        assert_eq!(dt.day(), 5);
    }

    #[test]
    fn test_parse_unix_seconds() {
        let dt = parse_timestamp("1709649000").unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_parse_unix_milliseconds() {
        let dt = parse_unix_timestamp(1_709_649_000_000.0).unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_parse_unix_microseconds() {
        let dt = parse_unix_timestamp(1_709_649_000_000_000.0).unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_nanoseconds_rejected() {
        assert!(matches!(
            parse_unix_timestamp(1_709_649_000_000_000_000.0),
            Err(TimestampError::NanosecondPrecision)
        ));
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(matches!(
            parse_timestamp(""),
            Err(TimestampError::EmptyString)
        ));
    }

    #[test]
    fn test_parse_freshness_tolerant() {
        assert!(parse_freshness(&json!("2024-03-05T00:00:00Z")).is_some());
        assert!(parse_freshness(&json!(1_709_649_000)).is_some());
        assert!(parse_freshness(&json!(null)).is_none());
        assert!(parse_freshness(&json!("not a time")).is_none());
        assert!(parse_freshness(&json!(["2024"])).is_none());
    }

    #[test]
    fn test_freshness_ordering() {
        let older = parse_freshness(&json!("2024-03-01T00:00:00Z")).unwrap();
        let newer = parse_freshness(&json!("2024-03-05T00:00:00Z")).unwrap();
        assert!(newer > older);
    }
}

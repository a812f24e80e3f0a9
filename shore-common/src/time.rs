//! Timestamp normalization for the two textual forms the comm log writer emits.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// The historical asctime-style form, e.g. `Mon Jan 15 00:00:10 2024`.
const LEGACY_FORM: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized timestamp: {0:?}")]
pub struct TimestampParseError(pub String);

/// Parses either RFC 3339 (`2024-01-15T00:00:10Z`) or the legacy asctime form,
/// normalizing both to a UTC instant.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, LEGACY_FORM) {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    Err(TimestampParseError(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339() {
        let ts = parse_timestamp("2024-01-15T00:00:10Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 10).unwrap());
    }

    #[test]
    fn parses_legacy_asctime() {
        let ts = parse_timestamp("Mon Jan 15 00:00:10 2024").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 10).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("not a timestamp").is_err());
    }
}

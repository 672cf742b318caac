//! Canonical timestamp text.
//!
//! Timestamps travel through JSON as RFC 3339 strings in UTC with the
//! shortest fractional part that keeps full precision.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Parse an RFC 3339 timestamp and normalize it to UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::InvalidTimestamp {
            input: input.to_string(),
            message: e.to_string(),
        })
}

/// Render a timestamp in its canonical form.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed = parse_timestamp("2021-03-01T12:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 3, 1, 10, 30, 0).unwrap());
        assert_eq!(format_timestamp(&parsed), "2021-03-01T10:30:00Z");
    }

    #[test]
    fn rejects_dates_without_time() {
        let err = parse_timestamp("2021-03-01").unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));
    }
}

//! Go-style duration strings.
//!
//! Accepts sequences of `<number><unit>` such as `"300ms"`, `"1.5h"` or
//! `"2h45m"`, with units `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`. The bare
//! string `"0"` is also accepted. Use with `#[serde(with = "harvest_value::duration")]`;
//! deserialization additionally accepts an integer number of nanoseconds.

use std::fmt::Write;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

use crate::{Error, Result};

const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Parse a duration string.
pub fn parse(input: &str) -> Result<Duration> {
    let text = input.trim();
    if text.is_empty() {
        return Err(Error::duration(input, "empty duration"));
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.starts_with('-') {
        return Err(Error::duration(input, "negative durations are not supported"));
    }

    let mut rest = text.strip_prefix('+').unwrap_or(text);
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return Err(Error::duration(input, "expected a number"));
        }
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => NANOS_PER_MINUTE,
            "h" => NANOS_PER_HOUR,
            "" => return Err(Error::duration(input, format!("missing unit after {number}"))),
            other => return Err(Error::duration(input, format!("unknown unit {other:?}"))),
        };

        total = total
            .checked_add(scaled(input, number, scale)?)
            .ok_or_else(|| Error::duration(input, "duration overflows"))?;
    }

    let nanos = u64::try_from(total).map_err(|_| Error::duration(input, "duration overflows"))?;
    Ok(Duration::from_nanos(nanos))
}

fn scaled(input: &str, number: &str, scale: u128) -> Result<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(Error::duration(input, "expected a number"));
    }
    if fraction.contains('.') {
        return Err(Error::duration(input, format!("malformed number {number:?}")));
    }

    let invalid = |_| Error::duration(input, format!("malformed number {number:?}"));
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(invalid)?
    };
    let mut nanos = whole
        .checked_mul(scale)
        .ok_or_else(|| Error::duration(input, "duration overflows"))?;

    if !fraction.is_empty() {
        // Digits beyond nanosecond precision cannot change the result.
        let digits = &fraction[..fraction.len().min(18)];
        let value: u128 = digits.parse().map_err(invalid)?;
        nanos += value * scale / 10u128.pow(digits.len() as u32);
    }
    Ok(nanos)
}

/// Render a duration the way Go's `time.Duration` prints it.
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", with_fraction(nanos, 1_000));
    }
    if nanos < NANOS_PER_SECOND {
        return format!("{}ms", with_fraction(nanos, 1_000_000));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let rest = nanos % NANOS_PER_MINUTE;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", with_fraction(rest, NANOS_PER_SECOND));
    out
}

fn with_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let fraction = value % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let text = format!("{whole}.{fraction:0width$}");
    text.trim_end_matches('0').to_string()
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(*duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Nanos(u64),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Text(text) => parse(&text).map_err(serde::de::Error::custom),
        Repr::Nanos(nanos) => Ok(Duration::from_nanos(nanos)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse("2h45m").unwrap(), Duration::from_secs(2 * 3600 + 45 * 60));
        assert_eq!(parse("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse("0").unwrap(), Duration::ZERO);
        assert_eq!(parse(".5m").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "5", "5x", "-1s", "s", "1..2s", "1.2.3s"] {
            assert!(parse(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn formats_like_go() {
        assert_eq!(format(Duration::ZERO), "0s");
        assert_eq!(format(Duration::from_nanos(15)), "15ns");
        assert_eq!(format(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format(Duration::from_secs(5)), "5s");
        assert_eq!(format(Duration::from_secs(90)), "1m30s");
        assert_eq!(format(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format(Duration::from_millis(61_250)), "1m1.25s");
    }

    #[test]
    fn format_output_parses_back() {
        for d in [
            Duration::from_nanos(7),
            Duration::from_micros(42),
            Duration::from_millis(1234),
            Duration::from_secs(7 * 3600 + 5),
        ] {
            assert_eq!(parse(&format(d)).unwrap(), d);
        }
    }

    #[test]
    fn serde_accepts_text_and_nanoseconds() {
        #[derive(Deserialize)]
        struct Config {
            #[serde(with = "super")]
            timeout: Duration,
        }

        let text: Config = serde_json::from_str(r#"{"timeout": "5s"}"#).unwrap();
        assert_eq!(text.timeout, Duration::from_secs(5));

        let nanos: Config = serde_json::from_str(r#"{"timeout": 2000000000}"#).unwrap();
        assert_eq!(nanos.timeout, Duration::from_secs(2));
    }
}

//! Human-readable durations for configuration files
//!
//! Config values such as `timeout` or `retry.backoffBase` are written as
//! Go-style duration strings (`"250ms"`, `"30s"`, `"1m30s"`, `"1.5s"`) or as
//! plain integer milliseconds. Serialization always emits the string form.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

const NANOS_PER_UNIT: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1_000.0),
    ("µs", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse a duration string made of one or more `<number><unit>` terms.
///
/// A bare `"0"` is accepted. Negative durations are rejected.
///
/// # Errors
///
/// Returns a description of the problem when the input is empty, has a term
/// without a unit, uses an unknown unit, or exceeds `u64::MAX` nanoseconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err(format!("negative duration: {input}"));
    }

    let mut rest = s.strip_prefix('+').unwrap_or(s);
    let mut total_nanos = 0f64;

    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration: {input}"));
        }
        let value: f64 =
            rest[..number_len].parse().map_err(|_| format!("invalid duration: {input}"))?;
        rest = &rest[number_len..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(rest.len());
        if unit_len == 0 {
            return Err(format!("missing unit in duration: {input}"));
        }
        let unit = &rest[..unit_len];
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| format!("unknown unit {unit:?} in duration: {input}"))?;
        total_nanos += value * scale;
        rest = &rest[unit_len..];
    }

    let total_nanos = total_nanos.round();
    if total_nanos >= u64::MAX as f64 {
        return Err(format!("duration out of range: {input}"));
    }
    Ok(Duration::from_nanos(total_nanos as u64))
}

/// Format a duration the way it would be written in a config file.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let millis = duration.as_millis();
    if millis == 0 {
        return format!("{}us", duration.as_micros());
    }
    if millis < 1_000 || millis % 1_000 != 0 {
        return format!("{millis}ms");
    }

    let mut secs = duration.as_secs();
    let mut out = String::new();
    let hours = secs / 3_600;
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
        secs %= 3_600;
    }
    let minutes = secs / 60;
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
        secs %= 60;
    }
    if secs > 0 {
        out.push_str(&format!("{secs}s"));
    }
    out
}

/// Serde adapter for `Duration` fields.
///
/// ```rust
/// use std::time::Duration;
///
/// use courier_domain::utils::duration::human_duration;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "human_duration")]
///     timeout: Duration,
/// }
///
/// let parsed: Example = serde_json::from_str(r#"{"timeout":"1m30s"}"#).unwrap();
/// assert_eq!(parsed.timeout, Duration::from_secs(90));
/// ```
pub mod human_duration {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(millis) => Ok(Duration::from_millis(millis)),
            Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}

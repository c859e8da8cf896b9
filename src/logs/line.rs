use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Layouts accepted for timestamps that carry no UTC offset. These are read
/// as local wall-clock time.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Instant at which a device produced a log line, as supplied by the
/// delivery service
///
/// Any JSON value deserializes; values that are neither whole milliseconds
/// nor text are kept as `Other` and resolved on a best-effort basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch
    Millis(i64),
    /// RFC 3339 / ISO 8601 text
    Text(String),
    /// Fractional or out-of-range numbers, `null`, and anything else
    Other(Value),
}

impl Timestamp {
    /// Resolve the timestamp to a UTC instant
    ///
    /// Returns `None` when the source value cannot be interpreted.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Timestamp::Text(text) => parse_text(text.trim()),
            Timestamp::Other(Value::Number(n)) => n.as_f64().and_then(fractional_millis),
            Timestamp::Other(_) => None,
        }
    }
}

impl Default for Timestamp {
    /// Stands in for a line that arrived without a timestamp
    fn default() -> Self {
        Timestamp::Other(Value::Null)
    }
}

/// Whole milliseconds of a fractional epoch value, sub-millisecond part dropped
fn fractional_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() || ms < i64::MIN as f64 || ms >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(ms.trunc() as i64).single()
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    }

    NAIVE_LAYOUTS.iter().find_map(|layout| {
        NaiveDateTime::parse_from_str(text, layout)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc))
    })
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Millis(ms) => write!(f, "{}", ms),
            Timestamp::Text(text) => write!(f, "{}", text),
            Timestamp::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Timestamp::Millis(ms)
    }
}

/// A single log line produced by a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(default)]
    pub timestamp: Timestamp,
    pub message: String,
}

impl LogLine {
    pub fn new(timestamp: impl Into<Timestamp>, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
        }
    }
}

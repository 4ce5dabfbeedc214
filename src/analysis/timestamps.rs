// src/analysis/timestamps.rs

//! Timestamp markers in host-server logs.
//!
//! The host and the enclave client log lines ending in
//! `TIMESTAMP: <KEY> <RFC 3339 instant>`; the key and the instant are always
//! the last two whitespace-separated tokens of the line.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// Lines without this token are ignored.
pub const TIMESTAMP_MARKER: &str = "TIMESTAMP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedEvent {
    pub key: String,
    pub instant: DateTime<Utc>,
}

/// Parse an ISO-8601 instant. Instants without an offset are taken as UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// The event carried by `line`, if it is a well-formed timestamp line.
pub fn parse_line(line: &str) -> Option<TimestampedEvent> {
    if !line.contains(TIMESTAMP_MARKER) {
        return None;
    }

    let mut tokens = line.split_whitespace().rev();
    let instant_str = tokens.next()?;
    let key = tokens.next()?;

    match parse_instant(instant_str) {
        Some(instant) => Some(TimestampedEvent {
            key: key.to_string(),
            instant,
        }),
        None => {
            warn!(%line, "ignoring timestamp line with unparseable instant");
            None
        }
    }
}

/// All markers of one run's output.
///
/// A key that appears more than once keeps its last value.
pub fn collect_timestamps(text: &str) -> BTreeMap<String, DateTime<Utc>> {
    let mut marks = BTreeMap::new();
    for event in text.lines().filter_map(parse_line) {
        marks.insert(event.key, event.instant);
    }
    marks
}

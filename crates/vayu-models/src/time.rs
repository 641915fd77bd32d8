//! RFC 3339 timestamp helpers shared by the store and tests.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// A timestamp string that could not be parsed as RFC 3339.
#[derive(Debug, Error)]
#[error("invalid RFC 3339 timestamp {raw:?}: {source}")]
pub struct TimestampError {
    raw: String,
    source: chrono::ParseError,
}

/// Format a UTC instant as RFC 3339 with fixed microsecond precision.
///
/// The fixed width keeps stored timestamps lexicographically ordered,
/// which the history queries rely on.
pub fn format_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp, normalizing any offset to UTC.
pub fn parse_rfc3339_utc(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| TimestampError {
            raw: raw.to_string(),
            source,
        })
}

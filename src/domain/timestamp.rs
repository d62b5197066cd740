// Timestamp normalization - stored times into the display timezone
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use super::reading::StoredTime;

/// Format used for every time shown to users.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const AWARE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Error, PartialEq)]
pub enum TimestampError {
    #[error("invalid timestamp {0:?}: expected an ISO-8601 datetime")]
    Parse(String),
}

/// Convert a stored time into `tz`.
///
/// Text without an offset is read as UTC: the offset is attached, the clock
/// value is left alone.
pub fn normalize(time: &StoredTime, tz: Tz) -> Result<DateTime<Tz>, TimestampError> {
    let utc = match time {
        StoredTime::Instant(instant) => *instant,
        StoredTime::Text(text) => parse_iso8601(text)?,
    };
    Ok(utc.with_timezone(&tz))
}

/// Parse ISO-8601 text into a UTC instant.
pub fn parse_iso8601(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = text.trim();

    if let Ok(aware) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(aware.with_timezone(&Utc));
    }

    if let Some(aware) = AWARE_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
    {
        return Ok(aware.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| TimestampError::Parse(text.to_string()))
}

pub fn format_display(time: &DateTime<Tz>) -> String {
    time.format(DISPLAY_FORMAT).to_string()
}

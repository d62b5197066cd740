// Reading domain model
use chrono::{DateTime, Utc};

use super::timestamp::parse_iso8601;

/// Document id of the slot that always holds the most recent reading.
pub const LATEST_KEY: &str = "latest";

/// Time value as it comes back from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredTime {
    /// Native store timestamp, always UTC.
    Instant(DateTime<Utc>),
    /// ISO-8601 text, possibly without an offset.
    Text(String),
}

impl StoredTime {
    /// Absolute instant, if the value can be read as one.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredTime::Instant(instant) => Some(*instant),
            StoredTime::Text(text) => parse_iso8601(text).ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: String,
    pub value: f64,
    pub time: StoredTime,
}

impl Reading {
    pub fn new(id: impl Into<String>, value: f64, time: StoredTime) -> Self {
        Self {
            id: id.into(),
            value,
            time,
        }
    }

    pub fn is_latest_slot(&self) -> bool {
        self.id == LATEST_KEY
    }
}

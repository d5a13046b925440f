//! The persisted client record: key names and value encodings.
//!
//! Every field is stored as a string. Timestamps are epoch milliseconds.

use chrono::{DateTime, Utc};

/// Default prefix for every record key.
pub const DEFAULT_KEY_PREFIX: &str = "homodigital_";

/// Value written to the one-time initialized flag.
pub const FLAG_SET: &str = "true";

/// Fully-qualified storage keys for each record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
    pub identity: String,
    pub created_at: String,
    pub resonance: String,
    pub last_drift: String,
    pub entered_at: String,
    pub last_seen: String,
    pub initialized: String,
}

impl RecordKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            identity: format!("{prefix}field_id"),
            created_at: format!("{prefix}created_at"),
            resonance: format!("{prefix}resonance"),
            last_drift: format!("{prefix}last_drift"),
            entered_at: format!("{prefix}entered_at"),
            last_seen: format!("{prefix}last_seen"),
            initialized: format!("{prefix}initialized"),
        }
    }

    /// Keys written to both tiers. All of them are write-once.
    pub fn durable(&self) -> [&str; 3] {
        [
            self.identity.as_str(),
            self.created_at.as_str(),
            self.entered_at.as_str(),
        ]
    }

    pub fn all(&self) -> [&str; 7] {
        [
            self.identity.as_str(),
            self.created_at.as_str(),
            self.resonance.as_str(),
            self.last_drift.as_str(),
            self.entered_at.as_str(),
            self.last_seen.as_str(),
            self.initialized.as_str(),
        ]
    }
}

impl Default for RecordKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }
}

pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.timestamp_millis().to_string()
}

/// Decode a stored timestamp; malformed values read as absent.
pub fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis)
}

//! Read-only view of the field state for the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldStatus {
    Active,
    Initializing,
}

impl FieldStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Initializing => "INITIALIZING",
        }
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a status bar needs, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    pub identity: String,
    pub resonance: u8,
    pub active: bool,
    pub status: FieldStatus,
    pub field_age: String,
    pub last_seen: String,
}

impl FieldSnapshot {
    /// One-line rendering used by the terminal host.
    pub fn status_line(&self) -> String {
        format!(
            "FIELD: {}  RESONANCE: {}/100  ID: {}  AGE: {}  LAST SEEN: {}",
            self.status, self.resonance, self.identity, self.field_age, self.last_seen
        )
    }
}

impl fmt::Display for FieldSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_line())
    }
}

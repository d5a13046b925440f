//! Resonance — the bounded simulated engagement metric.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resonance value, always within `[Resonance::MIN, Resonance::MAX]`.
///
/// Displayed against a scale of 100 but never reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
pub struct Resonance(u8);

impl Resonance {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 98;
    pub const SCALE: u8 = 100;

    /// Clamp an arbitrary integer into range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Parse a stored decimal value, clamping it into range.
    ///
    /// Returns `None` for anything that is not an integer.
    pub fn parse_stored(raw: &str) -> Option<Self> {
        raw.trim().parse::<i64>().ok().map(Self::clamped)
    }

    /// Add a signed adjustment and clamp the result.
    pub fn adjusted(self, delta: i64) -> Self {
        Self::clamped((self.0 as i64).saturating_add(delta))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<Resonance> for u8 {
    fn from(r: Resonance) -> Self {
        r.0
    }
}

impl TryFrom<i64> for Resonance {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(format!(
                "resonance {value} outside {}..={}",
                Self::MIN,
                Self::MAX
            ))
        }
    }
}

impl fmt::Display for Resonance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Storage tier trait — one key/value persistence mechanism.
//!
//! The engine never talks to a tier directly; it goes through
//! `TieredStore` (in `fieldstate-storage`), which layers a fast tier over a
//! durable one. Implementations: in-memory, JSON file (with optional TTL and
//! value-size limit), and an always-failing tier for disabled storage.
//!
//! Reads and writes are synchronous and never suspend.

use crate::error::StoreError;
use chrono::Duration;

/// Per-write options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Also write to the durable tier.
    pub durable: bool,

    /// Time-to-live for this write. `None` uses the tier's default.
    /// Tiers without expiry ignore it.
    pub ttl: Option<Duration>,
}

impl WriteOptions {
    pub fn fast_only() -> Self {
        Self::default()
    }

    pub fn durable() -> Self {
        Self {
            durable: true,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A single storage tier.
pub trait StorageTier: Send + Sync {
    /// The tier name (e.g., "in_memory", "file", "unavailable").
    fn name(&self) -> &str;

    /// Read a value. Expired values read as `None`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one (last write wins).
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Remove a value. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Drop every value in the tier.
    fn clear(&self) -> Result<(), StoreError>;
}

//! Unavailable tier — stands in for storage that is disabled or blocked.
//!
//! Every operation fails with `StoreError::Unavailable`, which is exactly
//! what a host without usable persistence looks like to the engine.

use chrono::Duration;
use fieldstate_core::error::StoreError;
use fieldstate_core::store::StorageTier;

/// A tier on which every read and write fails.
pub struct UnavailableTier {
    reason: String,
}

impl UnavailableTier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

impl Default for UnavailableTier {
    fn default() -> Self {
        Self::new("storage disabled")
    }
}

impl StorageTier for UnavailableTier {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(self.fail())
    }

    fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), StoreError> {
        Err(self.fail())
    }

    fn remove(&self, _key: &str) -> Result<bool, StoreError> {
        Err(self.fail())
    }

    fn clear(&self) -> Result<(), StoreError> {
        Err(self.fail())
    }
}

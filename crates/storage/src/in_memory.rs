//! In-memory tier — useful for testing and ephemeral sessions.

use chrono::Duration;
use fieldstate_core::error::StoreError;
use fieldstate_core::store::StorageTier;
use std::collections::HashMap;
use std::sync::RwLock;

/// A tier that keeps values in a `HashMap` for the life of the process.
/// Has no expiry: the TTL of a write is ignored.
pub struct InMemoryTier {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryTier {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTier {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory tier lock poisoned".into())
}

impl StorageTier for InMemoryTier {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

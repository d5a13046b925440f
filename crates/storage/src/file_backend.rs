//! File-based tier — persistent JSON-lines storage with optional expiry.
//!
//! Each line is a JSON-encoded `StoredValue`. Entries are loaded into memory
//! on open. Every mutation re-reads the file, applies its change on top and
//! rewrites it, so handles sharing a path never drop each other's keys.
//! Fast reads, durable writes.
//!
//! Configured with a default TTL and a value-size limit this is the durable
//! tier; without them it serves as the fast tier of a native host.

use chrono::{DateTime, Duration, Utc};
use fieldstate_core::clock::{Clock, SystemClock};
use fieldstate_core::error::StoreError;
use fieldstate_core::store::StorageTier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// One persisted line.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    key: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// A file-backed tier using JSONL (one JSON object per line).
pub struct FileTier {
    path: PathBuf,
    entries: RwLock<HashMap<String, StoredValue>>,
    default_ttl: Option<Duration>,
    max_value_len: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl FileTier {
    /// Open a tier at the given path.
    ///
    /// If the file exists, entries are loaded from it.
    /// If it does not, the tier starts empty (file created on first write).
    pub fn open(path: PathBuf) -> Self {
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "File tier loaded");
        Self {
            path,
            entries: RwLock::new(entries),
            default_ttl: None,
            max_value_len: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Expire writes after `ttl` unless the write carries its own.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Reject values longer than `max` bytes.
    pub fn with_max_value_len(mut self, max: usize) -> Self {
        self.max_value_len = Some(max);
        self
    }

    /// Use the given clock for expiry decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load entries from a JSONL file. Later lines win over earlier ones.
    fn load_from_disk(path: &Path) -> HashMap<String, StoredValue> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(), // File doesn't exist yet, start empty
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StoredValue>(line) {
                Ok(entry) => Some((entry.key.clone(), entry)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping corrupted tier entry");
                    None
                }
            })
            .collect()
    }

    /// Rewrite the file with every live entry; expired ones are pruned.
    fn flush(&self, entries: &mut HashMap<String, StoredValue>) -> Result<(), StoreError> {
        let now = self.clock.now();
        entries.retain(|_, v| v.is_live(now));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("Failed to create tier directory: {e}")))?;
        }

        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();

        let mut content = String::new();
        for key in keys {
            let line = serde_json::to_string(&entries[key])
                .map_err(|e| StoreError::Serialization(format!("Failed to encode entry: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Io(format!("Failed to write tier file: {e}")))?;

        Ok(())
    }

    /// Apply `change` to the on-disk state and write it back.
    ///
    /// Another handle on the same path may have written since we loaded, so
    /// the file is the base rather than our in-memory copy.
    fn write_through<R>(
        &self,
        change: impl FnOnce(&mut HashMap<String, StoredValue>) -> R,
    ) -> Result<R, StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let mut merged = Self::load_from_disk(&self.path);
        let out = change(&mut merged);
        self.flush(&mut merged)?;
        *entries = merged;
        Ok(out)
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("file tier lock poisoned".into())
}

impl StorageTier for FileTier {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .get(key)
            .filter(|v| v.is_live(now))
            .map(|v| v.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        if let Some(max) = self.max_value_len {
            if value.len() > max {
                return Err(StoreError::ValueTooLarge {
                    key: key.to_string(),
                    len: value.len(),
                    max,
                });
            }
        }

        let expires_at = ttl.or(self.default_ttl).map(|ttl| self.clock.now() + ttl);
        let entry = StoredValue {
            key: key.to_string(),
            value: value.to_string(),
            expires_at,
        };
        self.write_through(|entries| {
            entries.insert(entry.key.clone(), entry);
        })
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.write_through(|entries| entries.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.clear();
        self.flush(&mut entries)
    }
}

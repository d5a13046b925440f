//! Tiered store — a fast tier layered over a durable one.
//!
//! Contract:
//!
//! - **Read**: fast tier first; on a miss (or a fast-tier failure) the
//!   durable tier is consulted.
//! - **Heal**: a durable hit for a key the fast tier lacks is copied back
//!   into the fast tier. Healing only ever runs durable → fast.
//! - **Write**: always to the fast tier; also to the durable tier when the
//!   write is marked durable. A failing tier is logged and reported, never
//!   fatal.
//! - **Concurrency**: none. Two instances writing the same key race and the
//!   last write wins.

use chrono::Duration;
use fieldstate_core::error::StoreError;
use fieldstate_core::store::{StorageTier, WriteOptions};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Which tiers accepted a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    pub fast: bool,
    /// `None` when the write was not durable.
    pub durable: Option<bool>,
}

impl WriteReport {
    /// Every tier that was asked to store the value did.
    pub fn is_complete(&self) -> bool {
        self.fast && self.durable.unwrap_or(true)
    }
}

/// A tier failure observed by the store, kept for the caller to inspect.
#[derive(Debug, Clone)]
pub struct TierFault {
    pub tier: String,
    pub error: StoreError,
}

/// The two-tier store.
pub struct TieredStore {
    fast: Arc<dyn StorageTier>,
    durable: Arc<dyn StorageTier>,
    durable_ttl: Duration,
    faults: Mutex<Vec<TierFault>>,
}

impl TieredStore {
    pub fn new(
        fast: Arc<dyn StorageTier>,
        durable: Arc<dyn StorageTier>,
        durable_ttl: Duration,
    ) -> Self {
        Self {
            fast,
            durable,
            durable_ttl,
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Read a value, healing the fast tier from the durable one on a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        let fast_available = match self.fast.get(key) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => true,
            Err(e) => {
                self.record_fault(self.fast.name(), e);
                false
            }
        };

        let value = match self.durable.get(key) {
            Ok(value) => value?,
            Err(e) => {
                self.record_fault(self.durable.name(), e);
                return None;
            }
        };

        if fast_available {
            match self.fast.set(key, &value, None) {
                Ok(()) => debug!(key, "Healed fast tier from durable tier"),
                Err(e) => self.record_fault(self.fast.name(), e),
            }
        }

        Some(value)
    }

    /// Write a value. Failures are logged and reflected in the report.
    pub fn set(&self, key: &str, value: &str, opts: WriteOptions) -> WriteReport {
        let fast = match self.fast.set(key, value, None) {
            Ok(()) => true,
            Err(e) => {
                self.record_fault(self.fast.name(), e);
                false
            }
        };

        let durable = opts.durable.then(|| {
            let ttl = opts.ttl.unwrap_or(self.durable_ttl);
            match self.durable.set(key, value, Some(ttl)) {
                Ok(()) => true,
                Err(e) => {
                    self.record_fault(self.durable.name(), e);
                    false
                }
            }
        });

        WriteReport { fast, durable }
    }

    /// Eagerly heal every listed key the fast tier lacks but the durable
    /// tier holds. Returns the number of keys healed.
    pub fn reconcile<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        let mut healed = 0;
        for key in keys {
            match self.fast.get(key) {
                Ok(None) => {}
                Ok(Some(_)) => continue,
                Err(e) => {
                    self.record_fault(self.fast.name(), e);
                    // Fast tier unusable: nothing can be healed into it
                    return healed;
                }
            }

            let value = match self.durable.get(key) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    self.record_fault(self.durable.name(), e);
                    return healed;
                }
            };

            match self.fast.set(key, &value, None) {
                Ok(()) => healed += 1,
                Err(e) => {
                    self.record_fault(self.fast.name(), e);
                    return healed;
                }
            }
        }

        if healed > 0 {
            debug!(healed, "Reconciled fast tier from durable tier");
        }
        healed
    }

    /// Take every fault recorded since the last call.
    pub fn drain_faults(&self) -> Vec<TierFault> {
        match self.faults.lock() {
            Ok(mut faults) => std::mem::take(&mut *faults),
            Err(_) => Vec::new(),
        }
    }

    fn record_fault(&self, tier: &str, error: StoreError) {
        warn!(tier, error = %error, "Storage tier failed, continuing without it");
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(TierFault {
                tier: tier.to_string(),
                error,
            });
        }
    }
}

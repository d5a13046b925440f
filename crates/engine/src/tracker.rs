//! Resonance tracker — initial value, drift replay at load, and the
//! engagement time bonus while active.
//!
//! The two growth channels do not commute once clamping is involved, so the
//! order is fixed: drift replay runs once at load, then the time bonus is
//! recomputed on every tick while the session is active. The displayed value
//! is whatever the last channel produced.

use crate::drift::{DriftEngine, Replay};
use chrono::{DateTime, Utc};
use fieldstate_config::{DriftConfig, ResonanceConfig};
use fieldstate_core::record::{self, FLAG_SET, RecordKeys};
use fieldstate_core::{FieldId, Resonance, WriteOptions};
use fieldstate_storage::TieredStore;
use rand::Rng;
use tracing::{debug, info, warn};

const DAY_MS: f64 = 86_400_000.0;

/// What `initialize` found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerLoad {
    pub value: Resonance,
    /// No initialized flag was found; a starting value was assigned.
    pub fresh: bool,
    /// The stored value was missing or malformed and the base was used.
    pub repaired: bool,
    pub replay: Option<Replay>,
}

pub struct ResonanceTracker {
    config: ResonanceConfig,
    drift: Option<DriftEngine>,
    baseline: Resonance,
    current: Resonance,
}

impl ResonanceTracker {
    pub fn new(config: &ResonanceConfig, drift: &DriftConfig) -> Self {
        let base = Resonance::clamped(config.base as i64);
        Self {
            config: config.clone(),
            drift: drift.enabled.then(|| DriftEngine::from_config(drift)),
            baseline: base,
            current: base,
        }
    }

    pub fn drift_enabled(&self) -> bool {
        self.drift.is_some()
    }

    /// Value the time bonus is added to.
    pub fn baseline(&self) -> Resonance {
        self.baseline
    }

    pub fn current(&self) -> Resonance {
        self.current
    }

    /// Establish the load-time value for `identity`.
    ///
    /// First run: drift enabled draws from the initial band, otherwise the
    /// base is used; the value, `last_drift = now` and the initialized flag
    /// are persisted. Later runs read the stored value and replay the hours
    /// missed since the last applied drift.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        store: &TieredStore,
        keys: &RecordKeys,
        identity: &FieldId,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> TrackerLoad {
        let initialized = store.get(&keys.initialized).as_deref() == Some(FLAG_SET);

        let load = if initialized {
            self.resume(store, keys, identity, now)
        } else {
            self.first_run(store, keys, now, rng)
        };

        self.baseline = load.value;
        self.current = load.value;
        load
    }

    fn first_run<R: Rng + ?Sized>(
        &self,
        store: &TieredStore,
        keys: &RecordKeys,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> TrackerLoad {
        let value = if self.drift_enabled() {
            let (lo, hi) = (self.config.initial_min, self.config.initial_max);
            let drawn = rng.random_range(lo.min(hi)..=lo.max(hi));
            Resonance::clamped(drawn as i64)
        } else {
            Resonance::clamped(self.config.base as i64)
        };

        store.set(&keys.resonance, &value.to_string(), WriteOptions::fast_only());
        store.set(
            &keys.last_drift,
            &record::encode_timestamp(now),
            WriteOptions::fast_only(),
        );
        store.set(&keys.initialized, FLAG_SET, WriteOptions::fast_only());

        info!(resonance = %value, "Resonance initialized");
        TrackerLoad {
            value,
            fresh: true,
            repaired: false,
            replay: None,
        }
    }

    fn resume(
        &self,
        store: &TieredStore,
        keys: &RecordKeys,
        identity: &FieldId,
        now: DateTime<Utc>,
    ) -> TrackerLoad {
        let stored = store
            .get(&keys.resonance)
            .and_then(|raw| Resonance::parse_stored(&raw));
        let repaired = stored.is_none();
        let start = stored.unwrap_or_else(|| {
            warn!(base = self.config.base, "Stored resonance missing or malformed, using base");
            Resonance::clamped(self.config.base as i64)
        });

        let Some(drift) = self.drift else {
            if repaired {
                store.set(&keys.resonance, &start.to_string(), WriteOptions::fast_only());
            }
            return TrackerLoad {
                value: start,
                fresh: false,
                repaired,
                replay: None,
            };
        };

        let last_applied = match store
            .get(&keys.last_drift)
            .and_then(|raw| record::decode_timestamp(&raw))
        {
            Some(at) => at,
            None => {
                // Unknown history counts as zero elapsed time
                warn!("Last drift timestamp missing or malformed, treating as now");
                store.set(
                    &keys.last_drift,
                    &record::encode_timestamp(now),
                    WriteOptions::fast_only(),
                );
                now
            }
        };

        let replay = drift.replay(identity.as_str(), start, last_applied, now);

        if replay.hours_elapsed > 0 {
            store.set(&keys.resonance, &replay.value.to_string(), WriteOptions::fast_only());
            store.set(
                &keys.last_drift,
                &record::encode_timestamp(replay.applied_through),
                WriteOptions::fast_only(),
            );
            debug!(
                hours_elapsed = replay.hours_elapsed,
                hours_applied = replay.hours_applied,
                from = %start,
                to = %replay.value,
                "Drift replayed"
            );
        } else if repaired {
            store.set(&keys.resonance, &start.to_string(), WriteOptions::fast_only());
        }

        TrackerLoad {
            value: replay.value,
            fresh: false,
            repaired,
            replay: Some(replay),
        }
    }

    /// Recompute the engagement bonus: `floor(days_active × bonus_per_day)`
    /// on top of the baseline, clamped. Not persisted.
    pub fn apply_time_bonus(&mut self, entered_at: DateTime<Utc>, now: DateTime<Utc>) -> Resonance {
        let days = ((now - entered_at).num_milliseconds().max(0) as f64) / DAY_MS;
        // Float-to-int casts saturate, so a huge rate cannot wrap
        let bonus = (days * self.config.bonus_per_day).floor() as i64;
        self.current = self.baseline.adjusted(bonus);
        self.current
    }
}

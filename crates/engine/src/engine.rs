//! The field engine — owns identity, resonance and session for one client
//! record and exposes the lifecycle the scheduler drives:
//!
//! ```text
//! load ──▶ tick* ──▶ unload
//!            ▲
//!          enter
//! ```
//!
//! Nothing here returns an error. Storage failures degrade to in-memory
//! values for the current load and surface only as `StorageDegraded`
//! events and `warn!` logs.

use crate::format;
use crate::session::SessionTracker;
use crate::snapshot::{FieldSnapshot, FieldStatus};
use crate::tracker::{ResonanceTracker, TrackerLoad};
use chrono::{DateTime, Utc};
use fieldstate_config::FieldConfig;
use fieldstate_core::record::{self, RecordKeys};
use fieldstate_core::{Clock, EventBus, FieldEvent, FieldId, Resonance, SystemClock, WriteOptions};
use fieldstate_storage::TieredStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the engine needs from the outside world.
pub struct FieldContext {
    config: FieldConfig,
    store: TieredStore,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    events: Option<Arc<EventBus>>,
}

impl FieldContext {
    pub fn new(config: FieldConfig, store: TieredStore) -> Self {
        Self {
            config,
            store,
            clock: Arc::new(SystemClock),
            rng: StdRng::from_os_rng(),
            events: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make identity generation and the initial draw reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }
}

/// What happened during `load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub identity_created: bool,
    /// The identity was missing from the fast tier and healed from the
    /// durable one.
    pub identity_restored: bool,
    /// Durable keys other than the identity healed into the fast tier.
    pub keys_healed: usize,
    pub resonance: TrackerLoad,
    pub reconnection: bool,
    pub storage_faults: usize,
}

pub struct FieldEngine {
    store: TieredStore,
    clock: Arc<dyn Clock>,
    events: Option<Arc<EventBus>>,
    keys: RecordKeys,
    identity: FieldId,
    tracker: ResonanceTracker,
    session: SessionTracker,
    report: LoadReport,
}

impl FieldEngine {
    /// Restore (or create) the client record and bring resonance up to date.
    pub fn load(ctx: FieldContext) -> Self {
        let FieldContext {
            config,
            store,
            clock,
            mut rng,
            events,
        } = ctx;
        let now = clock.now();
        let keys = RecordKeys::with_prefix(&config.storage.key_prefix);

        let identity_restored = store.reconcile([keys.identity.as_str()]) == 1;
        let keys_healed = store.reconcile(
            keys.durable()
                .into_iter()
                .filter(|key| *key != keys.identity),
        );

        let mut identity_created = false;
        let identity = match store.get(&keys.identity) {
            Some(token) => {
                if !FieldId::is_well_formed(&token) {
                    warn!(identity = %token, "Stored identity does not match the token grammar, keeping it");
                }
                FieldId::from_stored(token)
            }
            None => {
                let id = FieldId::generate_with(&mut rng);
                store.set(&keys.identity, id.as_str(), WriteOptions::durable());
                identity_created = true;
                id
            }
        };

        let created_at = match store
            .get(&keys.created_at)
            .and_then(|raw| record::decode_timestamp(&raw))
        {
            Some(at) => at,
            None => {
                store.set(
                    &keys.created_at,
                    &record::encode_timestamp(now),
                    WriteOptions::durable(),
                );
                now
            }
        };

        let mut tracker = ResonanceTracker::new(&config.resonance, &config.drift);
        let resonance = tracker.initialize(&store, &keys, &identity, now, &mut rng);

        let session = SessionTracker::load(
            &store,
            &keys,
            created_at,
            now,
            config.session.reconnect_threshold(),
        );
        if let Some(entered_at) = session.state().entered_at() {
            tracker.apply_time_bonus(entered_at, now);
        }

        let reconnection = session
            .reconnection_pending()
            .then(|| session.last_seen_delta(now))
            .flatten();

        let mut engine = Self {
            report: LoadReport {
                identity_created,
                identity_restored,
                keys_healed,
                resonance,
                reconnection: reconnection.is_some(),
                storage_faults: 0,
            },
            store,
            clock,
            events,
            keys,
            identity,
            tracker,
            session,
        };

        if identity_created {
            info!(identity = %engine.identity, "Field identity created");
            engine.publish(FieldEvent::IdentityCreated {
                identity: engine.identity.to_string(),
                timestamp: now,
            });
        } else if identity_restored {
            info!(identity = %engine.identity, "Field identity restored from durable tier");
            engine.publish(FieldEvent::IdentityRestored {
                identity: engine.identity.to_string(),
                timestamp: now,
            });
        }

        if let Some(replay) = resonance.replay.filter(|r| r.hours_applied > 0) {
            engine.publish(FieldEvent::DriftReplayed {
                hours_elapsed: replay.hours_elapsed,
                hours_applied: replay.hours_applied,
                from: replay.start.value(),
                to: replay.value.value(),
                timestamp: now,
            });
        }

        if let Some(away) = reconnection {
            info!(away_secs = away.num_seconds(), "Field reconnected");
            engine.publish(FieldEvent::Reconnected {
                away_secs: away.num_seconds(),
                timestamp: now,
            });
        }

        engine.report.storage_faults = engine.flush_faults(now);
        info!(
            identity = %engine.identity,
            resonance = %engine.tracker.current(),
            active = engine.is_active(),
            "Field loaded"
        );
        engine
    }

    /// Activate the session. Returns `false` when already active.
    pub fn enter(&mut self) -> bool {
        let now = self.clock.now();
        if !self.session.enter(&self.store, &self.keys, now) {
            return false;
        }

        self.tracker.apply_time_bonus(now, now);
        self.publish(FieldEvent::Activated { timestamp: now });
        self.flush_faults(now);
        true
    }

    /// Periodic update: recompute the time bonus while active.
    pub fn tick(&mut self) -> Resonance {
        let now = self.clock.now();
        if let Some(entered_at) = self.session.state().entered_at() {
            self.tracker.apply_time_bonus(entered_at, now);
        }
        self.tracker.current()
    }

    /// Final write before the client goes away.
    pub fn unload(&mut self) {
        let now = self.clock.now();
        self.session.mark_seen(&self.store, &self.keys, now);
        self.flush_faults(now);
        info!(identity = %self.identity, "Field unloaded");
    }

    /// Whether this load is a reconnection. True at most once.
    pub fn take_reconnection(&mut self) -> bool {
        self.session.take_reconnection()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        let now = self.clock.now();
        let active = self.is_active();
        FieldSnapshot {
            identity: self.identity.to_string(),
            resonance: self.tracker.current().value(),
            active,
            status: if active {
                FieldStatus::Active
            } else {
                FieldStatus::Initializing
            },
            field_age: format::field_age(self.session.field_age(now)),
            last_seen: format::last_seen(self.session.last_seen_delta(now)),
        }
    }

    pub fn identity(&self) -> &FieldId {
        &self.identity
    }

    pub fn resonance(&self) -> Resonance {
        self.tracker.current()
    }

    pub fn is_active(&self) -> bool {
        self.session.state().is_active()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.session.created_at()
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    fn publish(&self, event: FieldEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    fn flush_faults(&self, now: DateTime<Utc>) -> usize {
        let faults = self.store.drain_faults();
        let count = faults.len();
        for fault in faults {
            self.publish(FieldEvent::StorageDegraded {
                tier: fault.tier,
                error_message: fault.error.to_string(),
                timestamp: now,
            });
        }
        count
    }
}

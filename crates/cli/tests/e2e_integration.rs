//! End-to-end integration tests for the FieldState engine on file tiers.
//!
//! These tests exercise the full path a terminal client takes: load from
//! JSONL tier files, enter, tick, unload, and reload from fresh file
//! handles, with a manual clock standing in for wall time.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fieldstate_config::FieldConfig;
use fieldstate_core::record::{self, RecordKeys};
use fieldstate_core::{Clock, EventBus, FieldEvent, FieldId, ManualClock, StorageTier};
use fieldstate_engine::{FieldContext, FieldEngine, FieldStatus, drift_for};
use fieldstate_storage::{FileTier, TieredStore};
use fieldstate_workflow::FieldRuntime;

/// 2026-01-01T00:00:00Z
fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_767_225_600_000).unwrap()
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Client {
    dir: tempfile::TempDir,
    clock: Arc<ManualClock>,
    config: FieldConfig,
}

impl Client {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FieldConfig::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());
        Self {
            dir,
            clock: Arc::new(ManualClock::new(epoch())),
            config,
        }
    }

    fn without_drift() -> Self {
        let mut client = Self::new();
        client.config.drift.enabled = false;
        client
    }

    fn fast_path(&self) -> std::path::PathBuf {
        self.dir.path().join("local.jsonl")
    }

    fn durable_path(&self) -> std::path::PathBuf {
        self.dir.path().join("durable.jsonl")
    }

    /// Fresh file handles every time, as a new process would have.
    fn tiers(&self) -> (Arc<FileTier>, Arc<FileTier>) {
        let clock: Arc<dyn Clock> = self.clock.clone();
        let fast = FileTier::open(self.fast_path()).with_clock(clock.clone());
        let durable = FileTier::open(self.durable_path())
            .with_default_ttl(self.config.storage.durable_ttl())
            .with_max_value_len(self.config.storage.durable_max_value_bytes)
            .with_clock(clock);
        (Arc::new(fast), Arc::new(durable))
    }

    fn context(&self) -> FieldContext {
        let (fast, durable) = self.tiers();
        let store = TieredStore::new(fast, durable, self.config.storage.durable_ttl());
        FieldContext::new(self.config.clone(), store).with_clock(self.clock.clone())
    }

    fn load(&self) -> FieldEngine {
        FieldEngine::load(self.context())
    }

    fn read(&self, path: &Path, key: &str) -> Option<String> {
        let clock: Arc<dyn Clock> = self.clock.clone();
        FileTier::open(path.to_path_buf())
            .with_clock(clock)
            .get(key)
            .unwrap()
    }
}

// ── E2E: Lifecycle ───────────────────────────────────────────────────────

#[test]
fn e2e_load_enter_tick_unload_reload() {
    let client = Client::without_drift();
    let keys = RecordKeys::default();

    let mut engine = client.load();
    let identity = engine.identity().clone();
    assert!(engine.load_report().identity_created);
    assert_eq!(engine.snapshot().status, FieldStatus::Initializing);
    assert_eq!(engine.resonance().value(), 62);

    assert!(engine.enter());
    client.clock.advance(Duration::days(2));
    assert_eq!(engine.tick().value(), 63);
    engine.unload();
    drop(engine);

    // Both files exist and hold what they should
    assert_eq!(
        client.read(&client.durable_path(), &keys.identity).as_deref(),
        Some(identity.as_str())
    );
    assert!(client.read(&client.durable_path(), &keys.resonance).is_none());
    assert_eq!(
        client.read(&client.fast_path(), &keys.last_seen),
        Some(record::encode_timestamp(epoch() + Duration::days(2)))
    );

    // Come back 90 minutes later
    client.clock.advance(Duration::minutes(90));
    let mut engine = client.load();
    assert_eq!(engine.identity(), &identity);
    assert!(!engine.load_report().identity_created);
    assert!(engine.is_active());
    assert!(engine.take_reconnection());
    assert!(!engine.take_reconnection());

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, FieldStatus::Active);
    assert_eq!(snapshot.last_seen, "1h ago");
    assert_eq!(snapshot.field_age, "2d 1h 30m");
    // 2 days 90 minutes active → +1
    assert_eq!(snapshot.resonance, 63);
}

#[test]
fn e2e_deleted_fast_tier_restores_identity() {
    let client = Client::new();
    let keys = RecordKeys::default();

    let mut engine = client.load();
    let identity = engine.identity().clone();
    assert!(engine.enter());
    engine.unload();
    drop(engine);

    std::fs::remove_file(client.fast_path()).unwrap();
    client.clock.advance(Duration::minutes(10));

    let events = Arc::new(EventBus::default());
    let mut rx = events.subscribe();
    let engine = FieldEngine::load(client.context().with_events(events));

    assert_eq!(engine.identity(), &identity);
    assert!(engine.load_report().identity_restored);
    assert!(!engine.load_report().identity_created);
    // Activation lives in the durable tier too
    assert!(engine.is_active());
    assert_eq!(engine.created_at(), epoch());

    assert_eq!(
        client.read(&client.fast_path(), &keys.identity).as_deref(),
        Some(identity.as_str())
    );

    let first = rx.try_recv().unwrap();
    assert!(matches!(&*first, FieldEvent::IdentityRestored { .. }));
}

#[test]
fn e2e_drift_replays_across_restarts() {
    let client = Client::new();
    let keys = RecordKeys::default();

    let mut engine = client.load();
    let identity = engine.identity().clone();
    let start = engine.resonance();
    assert!((8..=15).contains(&start.value()));
    engine.unload();
    drop(engine);

    client.clock.advance(Duration::hours(3) + Duration::minutes(20));
    let engine = client.load();

    let mut expected = start;
    for k in 1..=3 {
        let delta = drift_for(identity.as_str(), epoch() + Duration::hours(k));
        expected = expected.adjusted(delta.value());
    }
    assert_eq!(engine.resonance(), expected);

    let replay = engine.load_report().resonance.replay.unwrap();
    assert_eq!(replay.hours_applied, 3);
    assert_eq!(
        client.read(&client.fast_path(), &keys.resonance),
        Some(expected.value().to_string())
    );
    assert_eq!(
        client.read(&client.fast_path(), &keys.last_drift),
        Some(record::encode_timestamp(epoch() + Duration::hours(3)))
    );
}

#[test]
fn e2e_expired_durable_tier_starts_over() {
    let client = Client::new();

    let mut engine = client.load();
    engine.unload();
    drop(engine);

    // Past the durable TTL and with local storage gone
    client.clock.advance(Duration::days(366));
    std::fs::remove_file(client.fast_path()).unwrap();

    let engine = client.load();
    assert!(engine.load_report().identity_created);
    assert!(FieldId::is_well_formed(engine.identity().as_str()));
    assert!(!engine.load_report().identity_restored);
    assert_eq!(engine.created_at(), client.clock.now());
}

#[test]
fn e2e_corrupted_fast_tier_line_is_skipped() {
    let client = Client::without_drift();
    let keys = RecordKeys::default();

    let mut engine = client.load();
    let identity = engine.identity().clone();
    engine.unload();
    drop(engine);

    let mut content = std::fs::read_to_string(client.fast_path()).unwrap();
    content.push_str("{not json\n");
    std::fs::write(client.fast_path(), content).unwrap();

    let engine = client.load();
    assert_eq!(engine.identity(), &identity);
    assert_eq!(
        client.read(&client.fast_path(), &keys.resonance).as_deref(),
        Some("62")
    );
}

// ── E2E: Scheduled runtime ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn e2e_runtime_persists_activation() {
    let client = Client::without_drift();
    let keys = RecordKeys::default();

    let handle = FieldRuntime::new(&client.config.schedule).start(client.context());
    let mut snapshots = handle.snapshots();
    snapshots.changed().await.unwrap();
    assert!(!snapshots.borrow_and_update().as_ref().unwrap().active);

    assert!(handle.enter().await.unwrap());
    assert!(snapshots.borrow().as_ref().unwrap().active);

    client.clock.advance(Duration::days(4));
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow_and_update().as_ref().unwrap().resonance, 64);

    let engine = handle.shutdown().await.unwrap().unwrap();
    assert!(engine.is_active());

    assert_eq!(
        client.read(&client.durable_path(), &keys.entered_at),
        Some(record::encode_timestamp(epoch()))
    );
    assert_eq!(
        client.read(&client.fast_path(), &keys.last_seen),
        Some(record::encode_timestamp(epoch() + Duration::days(4)))
    );
}

//! Subcommand implementations.

pub mod config_cmd;
pub mod drift;
pub mod enter;
pub mod id;
pub mod status;
pub mod watch;

use fieldstate_config::FieldConfig;
use fieldstate_engine::FieldSnapshot;
use fieldstate_storage::{FileTier, TieredStore};
use std::sync::Arc;

/// Tier A file: no expiry, safe to delete.
pub const FAST_TIER_FILE: &str = "local.jsonl";
/// Tier B file: TTL and per-value size limit.
pub const DURABLE_TIER_FILE: &str = "durable.jsonl";

pub fn load_config() -> Result<FieldConfig, Box<dyn std::error::Error>> {
    Ok(FieldConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Both tiers as JSONL files in the configured data directory.
pub fn open_store(config: &FieldConfig) -> TieredStore {
    let dir = config.storage.resolved_data_dir();
    let fast = FileTier::open(dir.join(FAST_TIER_FILE));
    let durable = FileTier::open(dir.join(DURABLE_TIER_FILE))
        .with_default_ttl(config.storage.durable_ttl())
        .with_max_value_len(config.storage.durable_max_value_bytes);

    TieredStore::new(
        Arc::new(fast),
        Arc::new(durable),
        config.storage.durable_ttl(),
    )
}

pub fn print_snapshot(snapshot: &FieldSnapshot) {
    println!("◇ Field");
    println!("======");
    println!("  Status:     {}", snapshot.status);
    println!("  Resonance:  {}/100", snapshot.resonance);
    println!("  ID:         {}", snapshot.identity);
    println!("  Field age:  {}", snapshot.field_age);
    println!("  Last seen:  {}", snapshot.last_seen);
}

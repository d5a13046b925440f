//! `fieldstate status` — Load the field and print its state.

use super::{load_config, open_store, print_snapshot};
use fieldstate_engine::{FieldContext, FieldEngine};

pub async fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store = open_store(&config);
    let mut engine = FieldEngine::load(FieldContext::new(config, store));

    let snapshot = engine.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);

        let report = engine.load_report().clone();
        if report.identity_created {
            println!("\n  New field created");
        } else if report.identity_restored {
            println!("\n  Field restored from durable storage");
        }
        if let Some(replay) = report.resonance.replay.filter(|r| r.hours_applied > 0) {
            println!(
                "  Drift: {} hour(s) replayed ({} elapsed), {} → {}",
                replay.hours_applied, replay.hours_elapsed, replay.start, replay.value
            );
        }
        if engine.take_reconnection() {
            println!("  Reconnected after {}", snapshot.last_seen);
        }
        if report.storage_faults > 0 {
            println!("  ⚠️  Storage degraded, values kept in memory for this run");
        }
    }

    engine.unload();
    Ok(())
}

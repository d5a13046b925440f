//! `fieldstate watch` — Run the field runtime until Ctrl-C.

use super::{load_config, open_store};
use fieldstate_core::{EventBus, FieldEvent};
use fieldstate_engine::FieldContext;
use fieldstate_workflow::FieldRuntime;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

pub async fn run(enter: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    println!("◇ FieldState — watching");
    println!(
        "   Data dir:  {}",
        config.storage.resolved_data_dir().display()
    );
    println!(
        "   Load in {}s, tick every {}s (Ctrl-C to stop)",
        config.schedule.init_delay_secs, config.schedule.poll_interval_secs
    );

    let events = Arc::new(EventBus::default());
    let mut event_rx = events.subscribe();

    let store = open_store(&config);
    let ctx = FieldContext::new(config.clone(), store).with_events(events);
    let handle = FieldRuntime::new(&config.schedule).start(ctx);
    let mut snapshots = handle.snapshots();

    info!("Field runtime started");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut entered = false;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let Some(snapshot) = snapshot else { continue };
                println!("{}", snapshot.status_line());

                if enter && !entered {
                    entered = true;
                    handle.enter().await?;
                }
            }
            event = event_rx.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Field events dropped"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                println!();
                break;
            }
        }
    }

    if let Some(engine) = handle.shutdown().await? {
        println!("Field unloaded: {}", engine.snapshot().status_line());
    } else {
        println!("Stopped before the field loaded");
    }

    Ok(())
}

fn print_event(event: &FieldEvent) {
    match event {
        FieldEvent::IdentityCreated { identity, .. } => {
            println!("   ✨ New field: {identity}");
        }
        FieldEvent::IdentityRestored { identity, .. } => {
            println!("   ♻️  Field restored: {identity}");
        }
        FieldEvent::DriftReplayed {
            hours_applied,
            hours_elapsed,
            from,
            to,
            ..
        } => {
            println!("   〰 Drift: {hours_applied}/{hours_elapsed}h replayed, {from} → {to}");
        }
        FieldEvent::Activated { .. } => println!("   ✅ Field entered"),
        FieldEvent::Reconnected { away_secs, .. } => {
            println!("   👋 Reconnected after {}m away", away_secs / 60);
        }
        FieldEvent::StorageDegraded {
            tier,
            error_message,
            ..
        } => {
            println!("   ⚠️  Storage tier '{tier}' degraded: {error_message}");
        }
    }
}

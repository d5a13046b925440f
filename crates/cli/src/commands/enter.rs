//! `fieldstate enter` — Activate the session.

use super::{load_config, open_store, print_snapshot};
use fieldstate_engine::{FieldContext, FieldEngine};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store = open_store(&config);
    let mut engine = FieldEngine::load(FieldContext::new(config, store));

    if engine.enter() {
        println!("✅ Field entered\n");
    } else {
        println!("Field already active\n");
    }
    print_snapshot(&engine.snapshot());

    engine.unload();
    Ok(())
}

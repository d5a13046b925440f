//! # FieldState Engine
//!
//! The identity and resonance state engine. `FieldEngine` ties together:
//! - the deterministic hourly drift and its bounded catch-up replay
//! - the resonance tracker (initial draw, replay, time bonus)
//! - the one-way session state and last-seen bookkeeping
//!
//! All reads and writes go through a `TieredStore`; "now" always comes
//! from an injected `Clock`.

pub mod drift;
pub mod engine;
pub mod format;
pub mod session;
pub mod snapshot;
pub mod tracker;

pub use drift::{DriftDelta, DriftEngine, Replay, drift_for};
pub use engine::{FieldContext, FieldEngine, LoadReport};
pub use session::{SessionState, SessionTracker};
pub use snapshot::{FieldSnapshot, FieldStatus};
pub use tracker::{ResonanceTracker, TrackerLoad};

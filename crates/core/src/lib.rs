//! # FieldState Core
//!
//! Domain types, traits, and error definitions for the FieldState identity
//! and resonance engine. Everything here is storage- and runtime-agnostic:
//! it defines the model that the other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is defined here as a trait or a plain value type:
//! - `StorageTier` is the contract for one persistence mechanism
//! - `Clock` is the only source of "now", so every scheduled task can be
//!   driven by a synthetic clock in tests
//! - `FieldId` and `Resonance` carry their invariants in the type

pub mod error;
pub mod clock;
pub mod identity;
pub mod resonance;
pub mod record;
pub mod store;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, StoreError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::FieldId;
pub use resonance::Resonance;
pub use record::RecordKeys;
pub use store::{StorageTier, WriteOptions};
pub use event::{EventBus, FieldEvent};

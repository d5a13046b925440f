//! Storage tier implementations and the tiered store for FieldState.

pub mod in_memory;
pub mod file_backend;
pub mod unavailable;
pub mod tiered;

pub use in_memory::InMemoryTier;
pub use file_backend::FileTier;
pub use unavailable::UnavailableTier;
pub use tiered::{TierFault, TieredStore, WriteReport};

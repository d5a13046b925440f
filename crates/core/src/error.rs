//! Error types for the FieldState domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Storage failures have their own bounded-context enum because the engine
//! recovers from them locally instead of propagating them.

use thiserror::Error;

/// The top-level error type for FieldState operations that can fail.
#[derive(Debug, Error)]
pub enum Error {
    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    // --- Runtime ---
    #[error("Field runtime is no longer running")]
    RuntimeStopped,

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a single storage tier.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage tier unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Storage serialization failed: {0}")]
    Serialization(String),

    #[error("Value for {key} is {len} bytes, tier limit is {max}")]
    ValueTooLarge { key: String, len: usize, max: usize },
}

//! Field events — notifications for whoever renders the field state.
//!
//! The engine publishes an event when something interesting happens
//! (identity created, drift replayed, activation...). Subscribers react
//! without being wired into the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All events emitted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldEvent {
    /// A new identity was generated on a first-ever visit
    IdentityCreated {
        identity: String,
        timestamp: DateTime<Utc>,
    },

    /// The identity was found only in the durable tier and healed back
    IdentityRestored {
        identity: String,
        timestamp: DateTime<Utc>,
    },

    /// Missed hours were replayed at load
    DriftReplayed {
        hours_elapsed: u64,
        hours_applied: u32,
        from: u8,
        to: u8,
        timestamp: DateTime<Utc>,
    },

    /// The session went from inactive to active
    Activated { timestamp: DateTime<Utc> },

    /// The client came back after longer than the reconnection threshold
    Reconnected {
        away_secs: i64,
        timestamp: DateTime<Utc>,
    },

    /// A storage tier failed and the engine fell back to in-memory values
    StorageDegraded {
        tier: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for field events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<FieldEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: FieldEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<FieldEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

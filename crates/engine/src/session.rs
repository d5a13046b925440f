//! Session state — one-way activation plus last-seen bookkeeping.
//!
//! ```text
//! Inactive ──enter()──▶ Active(entered_at)
//! ```
//!
//! There is no way back to `Inactive`. Hiding the status display is a
//! presentation concern and never touches this state.

use chrono::{DateTime, Duration, Utc};
use fieldstate_core::record::{self, RecordKeys};
use fieldstate_core::WriteOptions;
use fieldstate_storage::TieredStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Inactive,
    Active { entered_at: DateTime<Utc> },
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn entered_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active { entered_at } => Some(*entered_at),
            Self::Inactive => None,
        }
    }
}

pub struct SessionTracker {
    state: SessionState,
    created_at: DateTime<Utc>,
    /// Last-seen timestamp as stored before this load.
    previous_seen: Option<DateTime<Utc>>,
    reconnection_pending: bool,
}

impl SessionTracker {
    /// Restore the session from storage.
    ///
    /// A stored entry timestamp means the session is already active. If it
    /// is, and the previous visit ended more than `reconnect_threshold`
    /// ago, a reconnection is pending for this load.
    pub fn load(
        store: &TieredStore,
        keys: &RecordKeys,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
        reconnect_threshold: Duration,
    ) -> Self {
        let state = match store
            .get(&keys.entered_at)
            .and_then(|raw| record::decode_timestamp(&raw))
        {
            Some(entered_at) => SessionState::Active { entered_at },
            None => SessionState::Inactive,
        };

        let previous_seen = store
            .get(&keys.last_seen)
            .and_then(|raw| record::decode_timestamp(&raw));

        let reconnection_pending = state.is_active()
            && previous_seen.is_some_and(|seen| now - seen > reconnect_threshold);

        debug!(
            active = state.is_active(),
            reconnection = reconnection_pending,
            "Session restored"
        );

        Self {
            state,
            created_at,
            previous_seen,
            reconnection_pending,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Activate the session. Returns `false` (and does nothing) when it is
    /// already active.
    pub fn enter(&mut self, store: &TieredStore, keys: &RecordKeys, now: DateTime<Utc>) -> bool {
        if self.state.is_active() {
            return false;
        }

        store.set(
            &keys.entered_at,
            &record::encode_timestamp(now),
            WriteOptions::durable(),
        );
        self.state = SessionState::Active { entered_at: now };
        info!(entered_at = %now, "Session activated");
        true
    }

    pub fn reconnection_pending(&self) -> bool {
        self.reconnection_pending
    }

    /// Whether this load is a reconnection. True at most once per load.
    pub fn take_reconnection(&mut self) -> bool {
        std::mem::take(&mut self.reconnection_pending)
    }

    /// Record the final last-seen timestamp (unload).
    pub fn mark_seen(&self, store: &TieredStore, keys: &RecordKeys, now: DateTime<Utc>) {
        store.set(
            &keys.last_seen,
            &record::encode_timestamp(now),
            WriteOptions::fast_only(),
        );
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn field_age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    pub fn last_seen_delta(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.previous_seen.map(|seen| now - seen)
    }
}

// SPDX-License-Identifier: MIT
//! Typed publish/subscribe channel for incremental list updates.
//!
//! Broadcast semantics: every event is delivered to all handlers subscribed
//! at emission time; late subscribers miss past events. Ordering is FIFO per
//! channel — nothing is guaranteed across independently racing emitters
//! beyond insertion order. Delivery is at-least-once from the consumer's
//! perspective (a lagged receiver falls back to a full refetch).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

/// One entry of the derived list (e.g., an agent in the sidebar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub name: String,
    /// Feature payload carried along untouched.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl ListItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            payload: Value::Null,
        }
    }
}

/// Incremental update carried on the [`SyncBus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SyncEvent {
    /// A new item appeared; consumers append it if the id is not present.
    Add { item: ListItem },
    /// An item disappeared; consumers filter it out (no-op if absent).
    Remove { id: String },
    /// No detail — consumers replace their list with a full refetch.
    Refresh,
}

impl SyncEvent {
    /// Decode a wire-shaped event, falling back to [`SyncEvent::Refresh`] for
    /// anything without a recognizable action/item/id payload. Legacy and
    /// malformed events therefore cost one full refetch instead of an error.
    pub fn from_json(value: &Value) -> SyncEvent {
        match serde_json::from_value::<SyncEvent>(value.clone()) {
            Ok(event) => event,
            Err(e) => {
                warn!(err = %e, "unrecognized sync event shape — treating as refresh");
                SyncEvent::Refresh
            }
        }
    }
}

/// Broadcasts [`SyncEvent`]s to all subscribed list owners.
///
/// Cheaply cloneable — any component that knows of a mutation can emit.
#[derive(Clone)]
pub struct SyncBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Send an event to all current subscribers.
    pub fn emit(&self, event: SyncEvent) {
        // Ignore errors — no subscribers is fine
        let _ = self.tx.send(event);
    }

    /// Decode-and-emit for callers holding a raw JSON event.
    pub fn emit_json(&self, value: &Value) {
        self.emit(SyncEvent::from_json(value));
    }

    /// Subscribe to all events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }
}

//! Scan lifecycle events for the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Library-wide event, broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LibraryEvent {
    /// A scan cycle has started.
    ScanStarted { forced: bool, at: DateTime<Utc> },
    /// A scan cycle has finished and the index was committed.
    ScanCompleted {
        cycle: u64,
        added: usize,
        updated: usize,
        removed: usize,
        errors: usize,
    },
    /// A scan cycle was abandoned without touching the index.
    ScanFailed { error: String },
}

/// Broadcast channel wrapper for [`LibraryEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LibraryEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all subscribers.
    pub fn broadcast(&self, event: LibraryEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("No subscribers for library event");
        }
    }
}

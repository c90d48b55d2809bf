//! Live-update events for queue and history changes.
//!
//! Delivery is fire-and-forget: a disconnected listener misses events and
//! re-synchronizes from the next snapshot it receives.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use super::types::{HistoryEntry, QueueEntry};

/// A committed-mutation notification carrying the current snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StoreEvent {
    Queue(Vec<QueueEntry>),
    History(Vec<HistoryEntry>),
}

/// Broadcast fan-out for store events. Clones share the channel.
#[derive(Debug, Clone)]
pub struct UpdatePublisher {
    tx: broadcast::Sender<StoreEvent>,
}

impl UpdatePublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a listener. Slow listeners may lag and drop events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Notify listeners; having none is not an error.
    pub fn emit(&self, event: StoreEvent) {
        if self.tx.send(event).is_err() {
            trace!("Store event emitted with no listeners");
        }
    }
}

impl Default for UpdatePublisher {
    fn default() -> Self {
        Self::new(64)
    }
}

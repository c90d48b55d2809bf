//! Persistent log of terminal queue entries.

use std::sync::Arc;

use crate::store::{KeyValueBackend, QueuedStore, StoreError};

use super::events::{StoreEvent, UpdatePublisher};
use super::types::{HistoryEntry, QueueStatus};

const NAMESPACE: &str = "history";

/// Durable history of completed, cancelled and relayed downloads, keyed by
/// pid. At most one entry per pid: writes overwrite by key.
pub struct HistoryStore {
    store: QueuedStore<HistoryEntry>,
    publisher: UpdatePublisher,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>, publisher: UpdatePublisher) -> Self {
        Self {
            store: QueuedStore::new(backend, NAMESPACE),
            publisher,
        }
    }

    /// Record a finished download. The status is forced to Complete.
    pub async fn add_history(&self, mut entry: HistoryEntry) -> Result<(), StoreError> {
        entry.status = QueueStatus::Complete;
        self.put(entry).await
    }

    /// Record an entry whose real transfer is owned by another integration;
    /// the given status is preserved.
    pub async fn add_relay(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.put(entry).await
    }

    /// Archive a cancelled download. The status is forced to Cancelled.
    pub async fn add_archive(&self, mut entry: HistoryEntry) -> Result<(), StoreError> {
        entry.status = QueueStatus::Cancelled;
        self.put(entry).await
    }

    /// Delete the entry with the matching pid, leaving others untouched.
    pub async fn remove_history(&self, pid: &str) -> Result<(), StoreError> {
        self.store.remove(pid).await?;
        self.emit();
        Ok(())
    }

    /// All persisted entries in insertion order; empty if the store is.
    pub fn get_history(&self) -> Vec<HistoryEntry> {
        self.store.values()
    }

    pub fn get(&self, pid: &str) -> Option<HistoryEntry> {
        self.store.get(pid)
    }

    async fn put(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let pid = entry.pid.clone();
        self.store.set(&pid, &entry).await?;
        self.emit();
        Ok(())
    }

    fn emit(&self) {
        self.publisher
            .emit(StoreEvent::History(self.get_history()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MediaKind;
    use crate::queue::QueueEntry;
    use crate::testing::MemoryBackend;

    fn entry(pid: &str, status: QueueStatus) -> QueueEntry {
        let mut entry = QueueEntry::new(pid, format!("{}.name", pid), MediaKind::Tv);
        entry.status = status;
        entry
    }

    fn history() -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryBackend::new()), UpdatePublisher::default())
    }

    #[tokio::test]
    async fn test_empty_history_is_empty_sequence() {
        assert!(history().get_history().is_empty());
    }

    #[tokio::test]
    async fn test_add_history_forces_complete() {
        let history = history();
        history
            .add_history(entry("a", QueueStatus::Downloading))
            .await
            .unwrap();

        assert_eq!(history.get("a").unwrap().status, QueueStatus::Complete);
    }

    #[tokio::test]
    async fn test_add_archive_forces_cancelled() {
        let history = history();
        history
            .add_archive(entry("a", QueueStatus::Downloading))
            .await
            .unwrap();

        assert_eq!(history.get("a").unwrap().status, QueueStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_add_relay_preserves_status() {
        let history = history();
        history
            .add_relay(entry("a", QueueStatus::Downloading))
            .await
            .unwrap();

        assert_eq!(history.get("a").unwrap().status, QueueStatus::Downloading);
    }

    #[tokio::test]
    async fn test_at_most_one_entry_per_pid() {
        let history = history();
        history
            .add_history(entry("a", QueueStatus::Complete))
            .await
            .unwrap();
        history
            .add_archive(entry("a", QueueStatus::Complete))
            .await
            .unwrap();

        let entries = history.get_history();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, QueueStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_remove_history_removes_only_matching_pid() {
        let history = history();
        let mut keep = entry("keep", QueueStatus::Complete);
        keep.app_id = Some("radarr".to_string());
        history.add_history(keep).await.unwrap();
        history
            .add_history(entry("drop", QueueStatus::Complete))
            .await
            .unwrap();

        history.remove_history("drop").await.unwrap();

        let entries = history.get_history();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pid, "keep");
        assert_eq!(entries[0].app_id.as_deref(), Some("radarr"));
    }

    #[tokio::test]
    async fn test_mutations_emit_history_events() {
        let publisher = UpdatePublisher::default();
        let mut rx = publisher.subscribe();
        let history = HistoryStore::new(Arc::new(MemoryBackend::new()), publisher);

        history
            .add_history(entry("a", QueueStatus::Complete))
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            StoreEvent::History(entries) => assert_eq!(entries.len(), 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

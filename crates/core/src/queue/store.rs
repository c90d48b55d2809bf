//! In-memory table of active downloads.

use std::sync::Mutex;

use super::events::{StoreEvent, UpdatePublisher};
use super::types::{QueueEntry, QueueStatus};

/// In-memory mapping from pid to [`QueueEntry`], insertion-ordered.
///
/// Mutated only by the download orchestrator's transition callbacks and by
/// explicit cancel requests. Updates are atomic per pid: a progress update
/// racing a cancel never interleaves partial field writes.
pub struct QueueStore {
    entries: Mutex<Vec<QueueEntry>>,
    publisher: UpdatePublisher,
}

impl QueueStore {
    pub fn new(publisher: UpdatePublisher) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            publisher,
        }
    }

    /// Add an entry, replacing any existing entry with the same pid in
    /// place (its queue position is kept).
    pub fn insert(&self, entry: QueueEntry) {
        let snapshot = {
            let mut entries = self.entries.lock().unwrap();
            match entries.iter_mut().find(|e| e.pid == entry.pid) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
            entries.clone()
        };
        self.publisher.emit(StoreEvent::Queue(snapshot));
    }

    /// Look up an entry by pid.
    pub fn get(&self, pid: &str) -> Option<QueueEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.pid == pid)
            .cloned()
    }

    /// Apply a closure to the entry for `pid` under the store lock.
    /// Returns the updated entry, or `None` if the pid is not queued.
    pub fn update<F>(&self, pid: &str, f: F) -> Option<QueueEntry>
    where
        F: FnOnce(&mut QueueEntry),
    {
        let (updated, snapshot) = {
            let mut entries = self.entries.lock().unwrap();
            let updated = match entries.iter_mut().find(|e| e.pid == pid) {
                Some(entry) => {
                    f(entry);
                    Some(entry.clone())
                }
                None => None,
            };
            (updated, entries.clone())
        };

        if updated.is_some() {
            self.publisher.emit(StoreEvent::Queue(snapshot));
        }
        updated
    }

    /// Remove an entry by pid, returning it if present.
    pub fn remove(&self, pid: &str) -> Option<QueueEntry> {
        let (removed, snapshot) = {
            let mut entries = self.entries.lock().unwrap();
            let removed = entries
                .iter()
                .position(|e| e.pid == pid)
                .map(|i| entries.remove(i));
            (removed, entries.clone())
        };

        if removed.is_some() {
            self.publisher.emit(StoreEvent::Queue(snapshot));
        }
        removed
    }

    /// Snapshot of the queue in insertion order. Never exposes the live
    /// structure.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Pids currently in a non-terminal state.
    pub fn active_pids(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !e.status.is_terminal())
            .map(|e| e.pid.clone())
            .collect()
    }

    pub fn contains(&self, pid: &str) -> bool {
        self.entries.lock().unwrap().iter().any(|e| e.pid == pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MediaKind;

    fn entry(pid: &str) -> QueueEntry {
        QueueEntry::new(pid, format!("{}.name", pid), MediaKind::Tv)
    }

    fn store() -> QueueStore {
        QueueStore::new(UpdatePublisher::default())
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let store = store();
        store.insert(entry("a"));
        store.insert(entry("b"));
        store.insert(entry("c"));

        let pids: Vec<String> = store.snapshot().into_iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_same_pid_replaces_in_place() {
        let store = store();
        store.insert(entry("a"));
        store.insert(entry("b"));

        let mut replacement = entry("a");
        replacement.status = QueueStatus::Downloading;
        store.insert(replacement);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].pid, "a");
        assert_eq!(snapshot[0].status, QueueStatus::Downloading);
    }

    #[test]
    fn test_update_is_atomic_and_returns_entry() {
        let store = store();
        store.insert(entry("a"));

        let updated = store
            .update("a", |e| {
                e.status = QueueStatus::Downloading;
                e.size_bytes = Some(1000);
                e.size_left_bytes = Some(900);
            })
            .unwrap();

        assert_eq!(updated.status, QueueStatus::Downloading);
        assert_eq!(updated.size_left_bytes, Some(900));
    }

    #[test]
    fn test_update_unknown_pid_is_none() {
        let store = store();
        assert!(store.update("ghost", |e| e.status = QueueStatus::Failed).is_none());
    }

    #[test]
    fn test_remove_returns_entry_once() {
        let store = store();
        store.insert(entry("a"));

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = store();
        store.insert(entry("a"));

        let mut snapshot = store.snapshot();
        snapshot[0].status = QueueStatus::Failed;

        assert_eq!(store.get("a").unwrap().status, QueueStatus::Queued);
    }

    #[test]
    fn test_active_pids_excludes_terminal() {
        let store = store();
        store.insert(entry("a"));
        store.insert(entry("b"));
        store.update("b", |e| e.status = QueueStatus::Failed);

        assert_eq!(store.active_pids(), vec!["a".to_string()]);
    }

    #[test]
    fn test_mutations_emit_queue_events() {
        let publisher = UpdatePublisher::default();
        let mut rx = publisher.subscribe();
        let store = QueueStore::new(publisher);

        store.insert(entry("a"));

        match rx.try_recv().unwrap() {
            StoreEvent::Queue(entries) => assert_eq!(entries.len(), 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

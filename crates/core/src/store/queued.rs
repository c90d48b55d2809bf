//! Persistent store with a serialized write queue.
//!
//! The backing store gives no ordering guarantee across independent
//! operations, so every mutation is funneled through a single writer task:
//! one mutation at a time, in submission order, each followed by a
//! durability flush before the next one starts. Reads bypass the queue.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{KeyValueBackend, StoreError};

enum Mutation {
    Set { key: String, value: String },
    Remove { key: String },
}

struct QueuedMutation {
    mutation: Mutation,
    ack: oneshot::Sender<Result<(), StoreError>>,
}

/// Durable key/value store whose mutations are totally ordered.
///
/// Clones share the same writer task and namespace.
pub struct QueuedStore<T> {
    backend: Arc<dyn KeyValueBackend>,
    namespace: String,
    tx: mpsc::UnboundedSender<QueuedMutation>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for QueuedStore<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            namespace: self.namespace.clone(),
            tx: self.tx.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> QueuedStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a store over one namespace of the backend and spawn its
    /// writer task. The task exits when every clone has been dropped.
    pub fn new(backend: Arc<dyn KeyValueBackend>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(run_writer(Arc::clone(&backend), namespace.clone(), rx));

        Self {
            backend,
            namespace,
            tx,
            _marker: PhantomData,
        }
    }

    /// Read and decode a value. Decode failures count as absent.
    pub fn get(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(&self.namespace, key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Read of {}/{} failed: {}", self.namespace, key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Stored value {}/{} is malformed: {}", self.namespace, key, e);
                None
            }
        }
    }

    /// Store a value. Resolves once the write and its flush have completed.
    pub async fn set(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.submit(Mutation::Set {
            key: key.to_string(),
            value: encoded,
        })
        .await
    }

    /// Remove a key. Resolves once the delete and its flush have completed.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.submit(Mutation::Remove {
            key: key.to_string(),
        })
        .await
    }

    /// All keys in this store's namespace.
    pub fn keys(&self) -> Vec<String> {
        match self.backend.keys(&self.namespace) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Listing keys of {} failed: {}", self.namespace, e);
                Vec::new()
            }
        }
    }

    /// All decodable values, in insertion order. A value that fails to
    /// decode is skipped without aborting the rest of the read.
    pub fn values(&self) -> Vec<T> {
        let raw = match self.backend.values(&self.namespace) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Listing values of {} failed: {}", self.namespace, e);
                return Vec::new();
            }
        };

        raw.iter()
            .filter_map(|v| match serde_json::from_str(v) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping malformed value in {}: {}", self.namespace, e);
                    None
                }
            })
            .collect()
    }

    async fn submit(&self, mutation: Mutation) -> Result<(), StoreError> {
        let (ack, done) = oneshot::channel();

        self.tx
            .send(QueuedMutation { mutation, ack })
            .map_err(|_| StoreError::WriterGone)?;

        done.await.map_err(|_| StoreError::WriterGone)?
    }
}

async fn run_writer(
    backend: Arc<dyn KeyValueBackend>,
    namespace: String,
    mut rx: mpsc::UnboundedReceiver<QueuedMutation>,
) {
    debug!("Store writer for {} started", namespace);

    while let Some(queued) = rx.recv().await {
        let result = match &queued.mutation {
            Mutation::Set { key, value } => backend.put(&namespace, key, value),
            Mutation::Remove { key } => backend.delete(&namespace, key),
        };

        let result = result.and_then(|_| backend.flush());

        if let Err(ref e) = result {
            warn!("Queued mutation on {} failed: {}", namespace, e);
        }

        // The caller may have given up waiting; that is fine.
        let _ = queued.ack.send(result);
    }

    debug!("Store writer for {} shutting down", namespace);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    fn record(name: &str, count: u32) -> Record {
        Record {
            name: name.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrips() {
        let backend = Arc::new(MemoryBackend::new());
        let store: QueuedStore<Record> = QueuedStore::new(backend, "test");

        store.set("a", &record("alpha", 1)).await.unwrap();

        assert_eq!(store.get("a"), Some(record("alpha", 1)));
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let backend = Arc::new(MemoryBackend::new());
        let store: QueuedStore<Record> = QueuedStore::new(backend, "test");

        assert!(store.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_remove_deletes_key() {
        let backend = Arc::new(MemoryBackend::new());
        let store: QueuedStore<Record> = QueuedStore::new(backend, "test");

        store.set("a", &record("alpha", 1)).await.unwrap();
        store.remove("a").await.unwrap();

        assert!(store.get("a").is_none());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_one_flush_per_mutation_in_submission_order() {
        let backend = Arc::new(MemoryBackend::new());
        let store: QueuedStore<Record> = QueuedStore::new(backend.clone(), "test");

        store.set("a", &record("alpha", 1)).await.unwrap();
        store.set("b", &record("beta", 2)).await.unwrap();
        store.remove("a").await.unwrap();

        assert_eq!(backend.flush_count(), 3);
        assert_eq!(
            backend.mutation_log(),
            vec![
                "put test/a".to_string(),
                "put test/b".to_string(),
                "delete test/a".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_sets_on_distinct_keys_both_complete() {
        let backend = Arc::new(MemoryBackend::new());
        let store: QueuedStore<Record> = QueuedStore::new(backend.clone(), "test");

        let s1 = store.clone();
        let s2 = store.clone();
        let rec1 = record("one", 1);
        let rec2 = record("two", 2);
        let (r1, r2) = tokio::join!(
            s1.set("one", &rec1),
            s2.set("two", &rec2),
        );

        r1.unwrap();
        r2.unwrap();
        assert_eq!(backend.flush_count(), 2);
        assert_eq!(store.values().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_value_reads_as_absent() {
        let backend = Arc::new(MemoryBackend::new());
        backend.put("test", "bad", "{not json").unwrap();
        let store: QueuedStore<Record> = QueuedStore::new(backend.clone(), "test");

        assert!(store.get("bad").is_none());
    }

    #[tokio::test]
    async fn test_values_skips_malformed_entries() {
        let backend = Arc::new(MemoryBackend::new());
        let store: QueuedStore<Record> = QueuedStore::new(backend.clone(), "test");

        store.set("good", &record("good", 1)).await.unwrap();
        backend.put("test", "bad", "garbage").unwrap();

        let values = store.values();
        assert_eq!(values, vec![record("good", 1)]);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_to_mutator() {
        let backend = Arc::new(MemoryBackend::failing());
        let store: QueuedStore<Record> = QueuedStore::new(backend, "test");

        let result = store.set("a", &record("alpha", 1)).await;
        assert!(result.is_err());
    }
}

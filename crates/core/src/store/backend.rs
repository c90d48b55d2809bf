//! Backend trait for durable key/value storage.

use thiserror::Error;

/// Errors that can occur in a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store writer is shut down")]
    WriterGone,
}

/// Trait for durable key/value storage backends.
///
/// Values are opaque strings; callers layer their own encoding on top.
/// A single backend instance is shared by every namespace, so implementations
/// must be safe to call from concurrent tasks.
pub trait KeyValueBackend: Send + Sync {
    /// Read a value, `None` if the key is absent.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&self, namespace: &str, key: &str) -> Result<(), StoreError>;

    /// All keys in a namespace.
    fn keys(&self, namespace: &str) -> Result<Vec<String>, StoreError>;

    /// All values in a namespace, in insertion order.
    fn values(&self, namespace: &str) -> Result<Vec<String>, StoreError>;

    /// Force written data to durable storage.
    fn flush(&self) -> Result<(), StoreError>;
}

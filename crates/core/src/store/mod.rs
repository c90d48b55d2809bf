//! Key/value persistence primitives shared by the queue, history and caches.

pub mod backend;
pub mod bounded;
pub mod queued;
pub mod sqlite;
pub mod ttl;

pub use backend::{KeyValueBackend, StoreError};
pub use bounded::BoundedFifo;
pub use queued::QueuedStore;
pub use sqlite::SqliteBackend;
pub use ttl::TtlCache;

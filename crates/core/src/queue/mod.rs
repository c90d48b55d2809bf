//! Download queue and history.

pub mod events;
pub mod history;
pub mod store;
pub mod types;

pub use events::{StoreEvent, UpdatePublisher};
pub use history::HistoryStore;
pub use store::QueueStore;
pub use types::{HistoryEntry, QueueEntry, QueueStatus};

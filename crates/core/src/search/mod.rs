//! Search orchestration: synonyms, caching, backends, filtering.

pub mod native;
pub mod orchestrator;
pub mod synonyms;
pub mod types;

pub use native::NativeIndex;
pub use orchestrator::SearchOrchestrator;
pub use synonyms::{MemorySynonymStore, Synonym, SynonymStore};
pub use types::{SearchConfig, SearchError, SearchHistoryEntry, SearchResult};

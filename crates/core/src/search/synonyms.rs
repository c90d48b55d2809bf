//! Search-term synonym substitution rules.
//!
//! Synonyms are owned by a separate entity store and consumed read-only
//! here; the trait is the boundary.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A configured search-term substitution rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synonym {
    /// Search term to match (case-insensitive).
    pub from: String,
    /// Replacement term used for the actual search.
    pub target: String,
    /// Literal name substituted into derived release names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_override: Option<String>,
    /// Comma-delimited guard terms; a term containing one is left alone.
    #[serde(default)]
    pub exemptions: String,
}

impl Synonym {
    /// Whether a guard term blocks this synonym for the given search term.
    pub fn is_exempt(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.exemptions
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .any(|g| term.contains(&g.to_lowercase()))
    }
}

/// Trait for the synonym entity store.
#[async_trait]
pub trait SynonymStore: Send + Sync {
    /// Look up the synonym matching a search term, if any.
    async fn get_synonym(&self, term: &str) -> Option<Synonym>;
}

/// In-memory synonym store, populated from configuration at startup.
#[derive(Debug, Default)]
pub struct MemorySynonymStore {
    synonyms: Mutex<HashMap<String, Synonym>>,
}

impl MemorySynonymStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_synonyms(synonyms: impl IntoIterator<Item = Synonym>) -> Self {
        let store = Self::new();
        for synonym in synonyms {
            store.add(synonym);
        }
        store
    }

    pub fn add(&self, synonym: Synonym) {
        self.synonyms
            .lock()
            .unwrap()
            .insert(synonym.from.to_lowercase(), synonym);
    }
}

#[async_trait]
impl SynonymStore for MemorySynonymStore {
    async fn get_synonym(&self, term: &str) -> Option<Synonym> {
        self.synonyms
            .lock()
            .unwrap()
            .get(&term.to_lowercase())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synonym(from: &str, target: &str, exemptions: &str) -> Synonym {
        Synonym {
            from: from.to_string(),
            target: target.to_string(),
            filename_override: None,
            exemptions: exemptions.to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let store = MemorySynonymStore::from_synonyms([synonym("The Show", "Other", "")]);

        assert!(store.get_synonym("the show").await.is_some());
        assert!(store.get_synonym("THE SHOW").await.is_some());
        assert!(store.get_synonym("another show").await.is_none());
    }

    #[test]
    fn test_exemptions_match_substrings() {
        let s = synonym("show", "other", "special, usa");

        assert!(s.is_exempt("show USA"));
        assert!(s.is_exempt("the Special edition"));
        assert!(!s.is_exempt("plain show"));
    }

    #[test]
    fn test_empty_exemptions_never_block() {
        let s = synonym("show", "other", "");
        assert!(!s.is_exempt("show"));
    }
}

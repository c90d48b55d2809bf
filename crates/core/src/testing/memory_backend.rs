//! In-memory key/value backend for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::store::{KeyValueBackend, StoreError};

/// In-memory [`KeyValueBackend`] that records flushes and mutations for
/// test assertions, and can be configured to fail every operation.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    // Insertion-ordered: (namespace, key, value) triples.
    entries: Mutex<Vec<(String, String, String)>>,
    mutation_log: Mutex<Vec<String>>,
    flushes: AtomicUsize,
    should_fail: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend where every operation fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Number of `flush` calls so far.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Mutations applied, in order, as "put ns/key" / "delete ns/key".
    pub fn mutation_log(&self) -> Vec<String> {
        self.mutation_log.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.should_fail {
            Err(StoreError::Database("mock failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|(ns, k, _)| ns == namespace && k == key)
            .map(|(_, _, v)| v.clone()))
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|(ns, k, _)| ns == namespace && k == key)
        {
            Some(entry) => entry.2 = value.to_string(),
            None => entries.push((
                namespace.to_string(),
                key.to_string(),
                value.to_string(),
            )),
        }
        self.mutation_log
            .lock()
            .unwrap()
            .push(format!("put {}/{}", namespace, key));
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .retain(|(ns, k, _)| !(ns == namespace && k == key));
        self.mutation_log
            .lock()
            .unwrap()
            .push(format!("delete {}/{}", namespace, key));
        Ok(())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(ns, _, _)| ns == namespace)
            .map(|(_, k, _)| k.clone())
            .collect())
    }

    fn values(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(ns, _, _)| ns == namespace)
            .map(|(_, _, v)| v.clone())
            .collect())
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.check()?;
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_log() {
        let backend = MemoryBackend::new();
        backend.put("ns", "k", "v").unwrap();

        assert_eq!(backend.get("ns", "k").unwrap(), Some("v".to_string()));
        assert_eq!(backend.mutation_log(), vec!["put ns/k".to_string()]);
    }

    #[test]
    fn test_failing_backend_fails_everything() {
        let backend = MemoryBackend::failing();
        assert!(backend.get("ns", "k").is_err());
        assert!(backend.put("ns", "k", "v").is_err());
        assert!(backend.flush().is_err());
    }
}

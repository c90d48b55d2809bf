//! TTL cache over the key/value backend.
//!
//! An optimization-only layer: a backend error, a malformed stored value or
//! an expired entry all read as "absent" and the caller recomputes. Writes
//! are not serialized; last-writer-wins is acceptable for recomputed values.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::KeyValueBackend;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    expires_at: i64,
    value: T,
}

/// Key/value cache with per-entry expiry.
pub struct TtlCache<T> {
    backend: Arc<dyn KeyValueBackend>,
    prefix: String,
    ttl: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TtlCache<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            prefix: self.prefix.clone(),
            ttl: self.ttl,
            _marker: PhantomData,
        }
    }
}

impl<T> TtlCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a cache namespaced by `prefix`, applying `ttl` to every `set`.
    pub fn new(backend: Arc<dyn KeyValueBackend>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            ttl,
            _marker: PhantomData,
        }
    }

    /// Read a cached value. Absent, expired, malformed and backend-error
    /// cases all return `None`.
    pub fn get(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(&self.prefix, key) {
            Ok(raw) => raw?,
            Err(e) => {
                debug!("Cache read {}/{} failed: {}", self.prefix, key, e);
                return None;
            }
        };

        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Cache entry {}/{} is malformed: {}", self.prefix, key, e);
                return None;
            }
        };

        if envelope.expires_at <= Utc::now().timestamp() {
            let _ = self.backend.delete(&self.prefix, key);
            return None;
        }

        Some(envelope.value)
    }

    /// Store a value with this cache's TTL. Failures are logged, not raised.
    pub fn set(&self, key: &str, value: &T) {
        let envelope = Envelope {
            expires_at: Utc::now().timestamp() + self.ttl.as_secs() as i64,
            value,
        };

        let encoded = match serde_json::to_string(&envelope) {
            Ok(encoded) => encoded,
            Err(e) => {
                debug!("Cache encode {}/{} failed: {}", self.prefix, key, e);
                return;
            }
        };

        if let Err(e) = self.backend.put(&self.prefix, key, &encoded) {
            debug!("Cache write {}/{} failed: {}", self.prefix, key, e);
        }
    }

    /// Drop a cached value.
    pub fn del(&self, key: &str) {
        if let Err(e) = self.backend.delete(&self.prefix, key) {
            debug!("Cache delete {}/{} failed: {}", self.prefix, key, e);
        }
    }
}

//! SQLite-backed key/value storage.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{KeyValueBackend, StoreError};

/// SQLite-backed key/value store.
///
/// One table holds every namespace; the `(namespace, key)` pair is the
/// primary key. Upserts keep the original rowid so `values()` reflects
/// insertion order rather than last-write order.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database file and initialize the schema.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            CREATE INDEX IF NOT EXISTS idx_kv_entries_namespace ON kv_entries(namespace);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

impl KeyValueBackend for SqliteBackend {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT value FROM kv_entries WHERE namespace = ? AND key = ?",
            params![namespace, key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO kv_entries (namespace, key, value) VALUES (?, ?, ?)
             ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value",
            params![namespace, key, value],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM kv_entries WHERE namespace = ? AND key = ?",
            params![namespace, key],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT key FROM kv_entries WHERE namespace = ? ORDER BY rowid ASC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![namespace], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<String>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn values(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT value FROM kv_entries WHERE namespace = ? ORDER BY rowid ASC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![namespace], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<String>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn flush(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        // In-memory connections have no WAL to checkpoint.
        conn.query_row("PRAGMA wal_checkpoint(FULL)", [], |_| Ok(()))
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_absent_key() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert!(backend.get("ns", "missing").unwrap().is_none());
    }

    #[test]
    fn test_put_get_roundtrip() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.put("ns", "k1", "v1").unwrap();
        assert_eq!(backend.get("ns", "k1").unwrap(), Some("v1".to_string()));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.put("a", "k", "from-a").unwrap();
        backend.put("b", "k", "from-b").unwrap();

        assert_eq!(backend.get("a", "k").unwrap(), Some("from-a".to_string()));
        assert_eq!(backend.get("b", "k").unwrap(), Some("from-b".to_string()));
        assert_eq!(backend.keys("a").unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn test_overwrite_keeps_insertion_order() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.put("ns", "first", "1").unwrap();
        backend.put("ns", "second", "2").unwrap();
        backend.put("ns", "first", "1-updated").unwrap();

        assert_eq!(
            backend.values("ns").unwrap(),
            vec!["1-updated".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn test_delete_absent_key_is_ok() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.delete("ns", "missing").unwrap();
    }

    #[test]
    fn test_delete_removes_only_matching_key() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.put("ns", "keep", "a").unwrap();
        backend.put("ns", "drop", "b").unwrap();

        backend.delete("ns", "drop").unwrap();

        assert_eq!(backend.keys("ns").unwrap(), vec!["keep".to_string()]);
        assert_eq!(backend.get("ns", "keep").unwrap(), Some("a".to_string()));
    }

    #[test]
    fn test_flush_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::new(&dir.path().join("kv.db")).unwrap();
        backend.put("ns", "k", "v").unwrap();
        backend.flush().unwrap();
    }

    #[test]
    fn test_flush_in_memory_is_ok() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.flush().unwrap();
    }
}

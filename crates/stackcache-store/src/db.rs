//! SQLite-backed durable store.
//!
//! A [`DurableStore`] binds one SQLite database to one directory and persists
//! string-keyed, JSON-serialized values in a single `entries` table. The
//! primary-key index gives point lookups and ascending key-ordered scans,
//! which is all the cache layer above needs.
//!
//! # Schema
//!
//! The database file lives at `<dir>/store.db` and holds exactly one table:
//!
//! ```sql
//! CREATE TABLE entries (
//!     key   TEXT PRIMARY KEY,
//!     value TEXT NOT NULL
//! );
//! ```
//!
//! Schema setup is automatic: [`DurableStore::open`] creates the directory,
//! the database, and the table as needed.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::{debug, info};

use crate::codec;
use crate::error::{CacheError, Result};

/// File name of the SQLite database inside a store directory.
const DB_FILE: &str = "store.db";

/// An ordered key-value store bound to one directory.
///
/// The store is the durable source of truth for its leaf namespace; the
/// in-memory mirror above it may lag until load or write-through occurs.
/// Directory ownership is exclusive by convention: SQLite does not reject a
/// second opener, so binding two stores to the same directory is a caller
/// error that only the busy timeout papers over.
pub struct DurableStore {
    conn: Connection,
    path: PathBuf,
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl DurableStore {
    /// Open (or create) the store bound to the directory `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StorageUnavailable`] if the directory cannot be
    /// created or the database cannot be opened and prepared.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        std::fs::create_dir_all(dir).map_err(|e| CacheError::StorageUnavailable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let db_path = dir.join(DB_FILE);
        let conn = Connection::open(&db_path).map_err(|e| CacheError::StorageUnavailable {
            path: db_path.clone(),
            reason: e.to_string(),
        })?;

        Self::configure_connection(&conn).map_err(|e| CacheError::StorageUnavailable {
            path: db_path.clone(),
            reason: e.to_string(),
        })?;

        info!(path = %dir.display(), "durable store ready");
        Ok(Self {
            conn,
            path: dir.to_path_buf(),
        })
    }

    /// Configure SQLite pragmas and ensure the schema exists.
    fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;

             CREATE TABLE IF NOT EXISTS entries (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )
    }

    /// The directory this store is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch the persisted serialized text for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`] if no entry exists.
    pub fn get(&self, key: &str) -> Result<String> {
        self.conn
            .query_row("SELECT value FROM entries WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| CacheError::key_not_found(key))
    }

    /// Check whether an entry for `key` is persisted.
    pub fn exists(&self, key: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM entries WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Serialize `value` and persist it under `key`, replacing any existing
    /// entry.
    pub fn put(&self, key: &str, value: &Value) -> Result<()> {
        self.put_raw(key, &codec::encode(value)?)
    }

    /// Persist pre-serialized text verbatim under `key`.
    ///
    /// Exists for importing entries whose textual form predates this store's
    /// codec; [`DurableStore::put`] lowers to it.
    pub fn put_raw(&self, key: &str, raw: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO entries (key, value) VALUES (?1, ?2)",
            params![key, raw],
        )?;
        debug!(key = %key, "store.put");
        Ok(())
    }

    /// Remove the entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`] if no entry exists, mirroring
    /// [`DurableStore::get`].
    pub fn delete(&self, key: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        if deleted == 0 {
            return Err(CacheError::key_not_found(key));
        }
        debug!(key = %key, "store.delete");
        Ok(())
    }

    /// Read every persisted entry in ascending key order.
    ///
    /// Each call re-runs the scan from the first key; there is no way to
    /// resume a previous scan mid-way.
    pub fn scan(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM entries ORDER BY key ASC")?;
        let entries = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(entries = entries.len(), "store.scan");
        Ok(entries)
    }

    /// Persist a whole batch of entries in a single transaction.
    ///
    /// With `sync` set, the write-ahead log is checkpointed before returning
    /// so the batch is durable on disk, not just committed.
    pub fn batch_write<'a, I>(&mut self, entries: I, sync: bool) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO entries (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, codec::encode(value)?])?;
                written += 1;
            }
        }
        tx.commit()?;

        if sync {
            self.conn
                .query_row("PRAGMA wal_checkpoint(FULL)", [], |_| Ok(()))?;
        }

        debug!(entries = written, sync, "store.batch_write");
        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_store(dir: &Path) -> DurableStore {
        DurableStore::open(dir.join("test-store")).unwrap()
    }

    #[test]
    fn open_creates_directory_and_database() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        assert!(store.path().is_dir());
        assert!(store.path().join(DB_FILE).is_file());
    }

    #[test]
    fn open_fails_when_path_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = DurableStore::open(&blocker);
        match result {
            Err(CacheError::StorageUnavailable { path, .. }) => assert_eq!(path, blocker),
            other => panic!("expected StorageUnavailable, got: {other:?}"),
        }
    }

    #[test]
    fn put_then_get_returns_serialized_text() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.put("vol-1", &json!({"size": 10})).unwrap();
        let raw = store.get("vol-1").unwrap();
        assert_eq!(raw, r#"{"size":10}"#);
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.put("k", &json!(1)).unwrap();
        store.put("k", &json!(2)).unwrap();
        assert_eq!(store.get("k").unwrap(), "2");
    }

    #[test]
    fn get_missing_key_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        match store.get("absent") {
            Err(CacheError::KeyNotFound { key }) => assert_eq!(key, "absent"),
            other => panic!("expected KeyNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn delete_missing_key_matches_get_semantics() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        match store.delete("absent") {
            Err(CacheError::KeyNotFound { key }) => assert_eq!(key, "absent"),
            other => panic!("expected KeyNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn delete_removes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.put("k", &json!("v")).unwrap();
        store.delete("k").unwrap();
        assert!(!store.exists("k").unwrap());
    }

    #[test]
    fn exists_reflects_persistence() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        assert!(!store.exists("k").unwrap());
        store.put("k", &json!(null)).unwrap();
        assert!(store.exists("k").unwrap());
    }

    #[test]
    fn scan_yields_entries_in_key_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.put("b", &json!(2)).unwrap();
        store.put("c", &json!(3)).unwrap();
        store.put("a", &json!(1)).unwrap();

        let keys: Vec<String> = store.scan().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn scan_restarts_from_the_beginning() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.put("a", &json!(1)).unwrap();
        let first = store.scan().unwrap();
        let second = store.scan().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn batch_write_persists_all_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_store(tmp.path());

        let a = json!("alpha");
        let b = json!(["b", "e", "t", "a"]);
        store.batch_write([("a", &a), ("b", &b)], true).unwrap();

        assert_eq!(store.get("a").unwrap(), "\"alpha\"");
        assert_eq!(store.get("b").unwrap(), r#"["b","e","t","a"]"#);
    }

    #[test]
    fn entries_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("persist");

        {
            let store = DurableStore::open(&dir).unwrap();
            store.put("k", &json!({"nested": [1, 2]})).unwrap();
        }

        let store = DurableStore::open(&dir).unwrap();
        assert_eq!(store.get("k").unwrap(), r#"{"nested":[1,2]}"#);
    }

    #[test]
    fn put_raw_stores_text_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.put_raw("legacy", "{'not': 'json'}").unwrap();
        assert_eq!(store.get("legacy").unwrap(), "{'not': 'json'}");
    }
}

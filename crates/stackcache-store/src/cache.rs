//! Write-through leaf cache.
//!
//! A [`LeafCache`] pairs one [`DurableStore`] with an in-memory
//! `HashMap<String, serde_json::Value>` that mirrors it. Reads are served
//! from memory; every `set` persists to the store and updates memory in the
//! same call, so the two views only diverge for values edited in place via
//! [`LeafCache::get_mut`]; [`LeafCache::flush`] reconciles those in one
//! durable batch.
//!
//! Loading tolerates values whose persisted text is not valid JSON: the raw
//! text is kept verbatim as a string value and the fallback is counted, so a
//! store written by an older serializer stays readable.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::codec;
use crate::db::DurableStore;
use crate::error::{CacheError, Result};

/// A durable key-value namespace with an in-memory mirror.
pub struct LeafCache {
    store: DurableStore,
    data: HashMap<String, Value>,
    fallbacks: u64,
}

impl LeafCache {
    /// Open the backing store bound to `dir` and load every persisted entry
    /// into memory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let store = DurableStore::open(dir)?;
        let mut leaf = Self {
            store,
            data: HashMap::new(),
            fallbacks: 0,
        };
        leaf.load()?;
        Ok(leaf)
    }

    /// Reconcile the in-memory mirror from the store.
    ///
    /// Every persisted entry is decoded; text that fails to parse is kept
    /// verbatim as a string value and recorded as a fallback.
    pub fn load(&mut self) -> Result<()> {
        let entries = self.store.scan()?;
        let total = entries.len();
        for (key, raw) in entries {
            let value = match codec::decode(&raw) {
                Some(value) => value,
                None => {
                    warn!(key = %key, "deserialization fallback: keeping raw text");
                    self.fallbacks += 1;
                    Value::String(raw)
                }
            };
            self.data.insert(key, value);
        }
        debug!(entries = total, fallbacks = self.fallbacks, "leaf loaded");
        Ok(())
    }

    /// Read a value from memory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`] if the key was never loaded or
    /// written.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.data
            .get(key)
            .ok_or_else(|| CacheError::key_not_found(key))
    }

    /// Read a value from memory for in-place mutation.
    ///
    /// Edits made through the returned reference reach disk on the next
    /// [`LeafCache::flush`]; until then memory is ahead of the store.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Value> {
        self.data
            .get_mut(key)
            .ok_or_else(|| CacheError::key_not_found(key))
    }

    /// Write-through insert: persist `value`, then update memory.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        self.store.put(&key, &value)?;
        debug!(key = %key, "leaf.set");
        self.data.insert(key, value);
        Ok(())
    }

    /// Insert `value` only if `key` has never been persisted.
    ///
    /// The presence probe goes against the store, not memory, so a value
    /// persisted by a previous process run is never clobbered by a default.
    /// Returns the value now held in memory for `key`.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: Value) -> Result<&Value> {
        let key = key.into();
        if !self.store.exists(&key)? {
            self.store.put(&key, &value)?;
            debug!(key = %key, "leaf.set_if_absent: persisted default");
        }
        Ok(self.data.entry(key).or_insert(value))
    }

    /// Remove an entry from the store, then from memory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`] if the key is absent from memory,
    /// matching [`LeafCache::get`].
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if !self.data.contains_key(key) {
            return Err(CacheError::key_not_found(key));
        }
        self.store.delete(key)?;
        self.data.remove(key);
        debug!(key = %key, "leaf.delete");
        Ok(())
    }

    /// Push the entire in-memory mirror back to the store in one durable
    /// batch.
    ///
    /// Under write-through this is a durability barrier; it also reconciles
    /// any in-place edits made via [`LeafCache::get_mut`]. Flushing twice
    /// without intervening mutation leaves the persisted state unchanged.
    pub fn flush(&mut self) -> Result<()> {
        let entries = self.data.iter().map(|(k, v)| (k.as_str(), v));
        self.store.batch_write(entries, true)?;
        debug!(entries = self.data.len(), "leaf.flush");
        Ok(())
    }

    /// Check whether a key exists in memory.
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries in memory.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all in-memory entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Iterate over all in-memory keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Number of load-time deserialization fallbacks recorded so far.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks
    }

    /// The backing durable store.
    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    /// The directory the backing store is bound to.
    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_leaf(dir: &Path) -> LeafCache {
        LeafCache::open(dir.join("leaf")).unwrap()
    }

    #[test]
    fn starts_empty_on_fresh_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let leaf = open_leaf(tmp.path());

        assert!(leaf.is_empty());
        assert_eq!(leaf.fallback_count(), 0);
    }

    #[test]
    fn set_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        let mut leaf = open_leaf(tmp.path());

        leaf.set("flavor-1", json!({"vcpus": 2, "ram": 4096})).unwrap();
        assert_eq!(leaf.get("flavor-1").unwrap(), &json!({"vcpus": 2, "ram": 4096}));
    }

    #[test]
    fn set_writes_through_to_the_store() {
        let tmp = tempfile::tempdir().unwrap();
        let mut leaf = open_leaf(tmp.path());

        let value = json!({"name": "server-a", "status": "ACTIVE"});
        leaf.set("srv-1", value.clone()).unwrap();

        // The store must agree with memory, independently.
        let raw = leaf.store().get("srv-1").unwrap();
        assert_eq!(codec::decode(&raw), Some(value));
    }

    #[test]
    fn values_round_trip_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("leaf");

        let shapes = [
            ("scalar-str", json!("plain")),
            ("scalar-num", json!(17)),
            ("scalar-bool", json!(true)),
            ("scalar-null", json!(null)),
            ("list", json!([1, "two", 3.0])),
            ("mapping", json!({"a": 1, "b": "x"})),
            ("nested", json!({"outer": {"inner": [{"deep": true}]}})),
        ];

        {
            let mut leaf = LeafCache::open(&dir).unwrap();
            for (key, value) in &shapes {
                leaf.set(*key, value.clone()).unwrap();
            }
        }

        let leaf = LeafCache::open(&dir).unwrap();
        for (key, value) in &shapes {
            assert_eq!(leaf.get(key).unwrap(), value, "shape {key} did not round-trip");
        }
        assert_eq!(leaf.len(), shapes.len());
        assert_eq!(leaf.fallback_count(), 0);
    }

    #[test]
    fn get_and_delete_agree_on_missing_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let mut leaf = open_leaf(tmp.path());

        assert!(matches!(
            leaf.get("ghost"),
            Err(CacheError::KeyNotFound { .. })
        ));
        assert!(matches!(
            leaf.delete("ghost"),
            Err(CacheError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn delete_removes_from_both_views() {
        let tmp = tempfile::tempdir().unwrap();
        let mut leaf = open_leaf(tmp.path());

        leaf.set("k", json!("v")).unwrap();
        leaf.delete("k").unwrap();

        assert!(!leaf.contains("k"));
        assert!(!leaf.store().exists("k").unwrap());
    }

    #[test]
    fn unparseable_persisted_text_falls_back_to_raw_string() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("leaf");

        {
            let store = DurableStore::open(&dir).unwrap();
            store.put_raw("legacy", "{'user': u'admin'}").unwrap();
            store.put("modern", &json!(1)).unwrap();
        }

        let leaf = LeafCache::open(&dir).unwrap();
        assert_eq!(leaf.get("legacy").unwrap(), &json!("{'user': u'admin'}"));
        assert_eq!(leaf.get("modern").unwrap(), &json!(1));
        assert_eq!(leaf.fallback_count(), 1);
    }

    #[test]
    fn set_if_absent_persists_only_new_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let mut leaf = open_leaf(tmp.path());

        let first = leaf.set_if_absent("k", json!("default")).unwrap().clone();
        assert_eq!(first, json!("default"));
        assert!(leaf.store().exists("k").unwrap());

        // Second call must not overwrite either view.
        let second = leaf.set_if_absent("k", json!("other")).unwrap().clone();
        assert_eq!(second, json!("default"));
        assert_eq!(leaf.store().get("k").unwrap(), "\"default\"");
    }

    #[test]
    fn set_if_absent_respects_values_from_a_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("leaf");

        {
            let mut leaf = LeafCache::open(&dir).unwrap();
            leaf.set("quota", json!(100)).unwrap();
        }

        let mut leaf = LeafCache::open(&dir).unwrap();
        let value = leaf.set_if_absent("quota", json!(10)).unwrap().clone();
        assert_eq!(value, json!(100));
        assert_eq!(leaf.store().get("quota").unwrap(), "100");
    }

    #[test]
    fn get_mut_edits_reach_disk_on_flush() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("leaf");

        {
            let mut leaf = LeafCache::open(&dir).unwrap();
            leaf.set("proj", json!({"enabled": true})).unwrap();

            *leaf.get_mut("proj").unwrap() = json!({"enabled": false});
            // Memory is ahead of the store until the flush.
            assert_eq!(leaf.store().get("proj").unwrap(), r#"{"enabled":true}"#);

            leaf.flush().unwrap();
        }

        let leaf = LeafCache::open(&dir).unwrap();
        assert_eq!(leaf.get("proj").unwrap(), &json!({"enabled": false}));
    }

    #[test]
    fn flush_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut leaf = open_leaf(tmp.path());

        leaf.set("a", json!(1)).unwrap();
        leaf.set("b", json!([2, 3])).unwrap();

        leaf.flush().unwrap();
        let first = leaf.store().scan().unwrap();
        leaf.flush().unwrap();
        let second = leaf.store().scan().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn iteration_and_length_reflect_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let mut leaf = open_leaf(tmp.path());

        leaf.set("a", json!(1)).unwrap();
        leaf.set("b", json!(2)).unwrap();

        assert_eq!(leaf.len(), 2);
        let mut keys: Vec<&String> = leaf.keys().collect();
        keys.sort();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(leaf.iter().count(), 2);
    }
}

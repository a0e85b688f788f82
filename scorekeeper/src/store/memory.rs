//! In-memory store, used by tests and throwaway sessions.

use serde_json::Value;
use std::collections::HashMap;

use super::{KeyValueStore, StoreResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
    writes: usize,
}

impl MemoryStore {
    /// Number of writes performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: Value) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_reads_none() {
        let store = MemoryStore::default();
        assert!(store.read("nothing").unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_whole_value() {
        let mut store = MemoryStore::default();
        store.write("k", json!({"a": 1, "b": 2})).unwrap();
        store.write("k", json!({"a": 3})).unwrap();
        assert_eq!(store.read("k").unwrap(), Some(json!({"a": 3})));
        assert_eq!(store.writes(), 2);
    }
}

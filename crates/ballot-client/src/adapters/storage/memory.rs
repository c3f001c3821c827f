use crate::domain::KVStoreError;
use crate::ports::KeyValueStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory key-value store.
///
/// Clones share the same map, so a test can hand one clone to a session,
/// drop the session and build a new one over the same data to simulate a
/// restart.
#[derive(Clone, Default)]
pub struct InMemoryKVStore {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKVStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Write a raw value, bypassing any encoding (for corrupt-record tests).
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.data.lock().insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &str) -> Result<Option<String>, KVStoreError> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), KVStoreError> {
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), KVStoreError> {
        self.data.lock().remove(key);
        Ok(())
    }
}

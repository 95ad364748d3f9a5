use crate::core::store::KeyValueStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// In-memory store; contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Store PUT for key: {}", key);
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        debug!("Store REMOVE for key: {}", key);
        Ok(())
    }
}

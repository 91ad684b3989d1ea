use std::collections::HashMap;

use super::{Backend, StoreError};

/// Process-local backend for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, storage_key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(storage_key).cloned())
    }

    fn put(&mut self, storage_key: &str, value: &str) -> Result<(), StoreError> {
        self.records.insert(storage_key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, storage_key: &str) -> Result<(), StoreError> {
        self.records.remove(storage_key);
        Ok(())
    }
}

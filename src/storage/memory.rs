//! In-memory storage backend

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{StorageBackend, StorageError};

/// In-memory key/value store
///
/// Backs tests and `--ephemeral` runs. Contents are lost on process exit.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.lock().get(path).cloned())
    }

    fn put(&self, path: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries.lock().insert(path.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(path);
        Ok(())
    }
}

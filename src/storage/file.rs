//! File-backed storage backend

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{StorageBackend, StorageError};

/// File-backed key/value store
///
/// Each key maps to one file under the storage root. Writes go to a
/// temporary sibling first and are published with an atomic rename, so a
/// crash mid-write never leaves a half-written record behind.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| StorageError::Io(format!("create storage dir {}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    fn entry_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        // Keys are flat identifiers; anything path-like is a caller bug
        if path.is_empty() || path.contains(['/', '\\', '.']) {
            return Err(StorageError::Io(format!("invalid storage key: {:?}", path)));
        }
        Ok(self.root.join(path))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entry = self.entry_path(path)?;
        match fs::read(&entry) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!("read {}: {}", entry.display(), e))),
        }
    }

    fn put(&self, path: &str, value: &[u8]) -> Result<(), StorageError> {
        let entry = self.entry_path(path)?;
        let tmp = self.root.join(format!("{}.tmp-{}", path, uuid::Uuid::new_v4()));

        fs::write(&tmp, value)
            .map_err(|e| StorageError::Io(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &entry).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StorageError::Io(format!("rename {} -> {}: {}", tmp.display(), entry.display(), e))
        })?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        let entry = self.entry_path(path)?;
        match fs::remove_file(&entry) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!("delete {}: {}", entry.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("ddkeys-storage-test-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_get_absent_returns_none() {
        let storage = FileStorage::open(temp_root()).unwrap();
        assert!(storage.get("config").unwrap().is_none());
    }

    #[test]
    fn test_put_get_delete_round_trip() {
        let storage = FileStorage::open(temp_root()).unwrap();
        storage.put("config", b"{\"host\":\"x\"}").unwrap();
        assert_eq!(storage.get("config").unwrap().unwrap(), b"{\"host\":\"x\"}");
        storage.delete("config").unwrap();
        assert!(storage.get("config").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let root = temp_root();
        {
            let storage = FileStorage::open(&root).unwrap();
            storage.put("config", b"persisted").unwrap();
        }
        let storage = FileStorage::open(&root).unwrap();
        assert_eq!(storage.get("config").unwrap().unwrap(), b"persisted");
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let storage = FileStorage::open(temp_root()).unwrap();
        assert!(storage.get("../escape").is_err());
        assert!(storage.put("a/b", b"x").is_err());
    }

    #[test]
    fn test_delete_absent_key_succeeds() {
        let storage = FileStorage::open(temp_root()).unwrap();
        assert!(storage.delete("missing").is_ok());
    }
}

//! Durable key/value storage backends
//!
//! The secrets engine persists its configuration through the [`StorageBackend`]
//! trait so the storage medium stays swappable: a file-backed store for normal
//! operation, an in-memory store for tests and `--ephemeral` runs.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::fmt;

/// Storage layer error types
#[derive(Debug)]
pub enum StorageError {
    /// Underlying I/O failure (read, write or delete)
    Io(String),
    /// Stored record could not be decoded
    Decode(String),
    /// Record could not be encoded for storage
    Encode(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "storage I/O error: {}", msg),
            StorageError::Decode(msg) => write!(f, "storage decode error: {}", msg),
            StorageError::Encode(msg) => write!(f, "storage encode error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Durable key/value store
///
/// Keys are flat path-like strings (e.g. `config`). Values are opaque bytes;
/// callers own the encoding. Reading an absent key is not an error.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored at `path`, `None` if never written
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write `value` at `path`, replacing any previous value
    fn put(&self, path: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove the value at `path`; deleting an absent key succeeds
    fn delete(&self, path: &str) -> Result<(), StorageError>;
}

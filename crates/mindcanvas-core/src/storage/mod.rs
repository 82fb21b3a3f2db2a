//! Storage abstraction for persistence.

mod autosave;
mod file;
mod memory;
mod snapshot;

pub use autosave::{AutoSaveManager, SaveOutcome};
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use snapshot::{RepairReport, SnapshotError, decode_snapshot, encode_snapshot};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable key-value storage of text values.
///
/// Implementations may store values in memory, on the filesystem, or in any
/// other backend that can hold a string per key.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Remove the value under `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}

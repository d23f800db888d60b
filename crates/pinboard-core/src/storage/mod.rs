//! Key/value storage abstraction for persistence.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for string key/value storage backends.
///
/// Implementations can store values in memory, on the filesystem, or in the
/// browser's localStorage. All access is synchronous: a board mutation is
/// persisted before it returns.
pub trait KeyValueStore {
    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Check if a key exists.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Create file storage in the platform data directory.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<std::sync::Arc<FileStorage>> {
    Ok(std::sync::Arc::new(FileStorage::default_location()?))
}

/// Create storage backed by the browser's localStorage.
#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<std::sync::Arc<LocalStorage>> {
    Ok(std::sync::Arc::new(LocalStorage::new()?))
}

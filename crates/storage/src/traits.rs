//! Storage trait definitions.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;

/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 512;

/// A single write in a batch.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchOp {
    Put { key: String, value: Bytes },
    Delete { key: String },
}

impl BatchOp {
    pub fn put(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Key-value store holding opaque values under string keys.
///
/// Writers on disjoint key ranges may run concurrently; backends serialize
/// writes to the same key.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Get a value, or `None` if the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>>;

    /// Put a value atomically, replacing any previous one.
    async fn put(&self, key: &str, value: Bytes) -> StorageResult<()>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Apply a batch of writes.
    ///
    /// Every operation is validated before any is applied. Backends apply the
    /// operations in order; a failure midway leaves the earlier ones applied.
    async fn batch(&self, ops: Vec<BatchOp>) -> StorageResult<()>;

    /// List all entries whose key starts with `prefix`, ordered by key.
    async fn scan(&self, prefix: &str) -> StorageResult<Vec<(String, Bytes)>>;

    /// Get the backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Check that the backend is reachable and usable.
    ///
    /// The default implementation returns Ok(()).
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Reject keys that no backend can store.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "key is {} bytes (max: {MAX_KEY_LEN})",
            key.len()
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(StorageError::InvalidKey(format!(
            "key contains control characters: {key:?}"
        )));
    }
    Ok(())
}

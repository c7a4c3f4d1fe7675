//! Key-value document storage for Hearth.
//!
//! This crate provides:
//! - The [`KeyValueStore`] trait with ordered prefix scans and batches
//! - Typed JSON documents and sublevels ([`DocumentStore`], [`Sublevel`])
//! - Backends: local filesystem and in-memory

pub mod backends;
pub mod document;
pub mod error;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, memory::MemoryBackend};
pub use document::{DocumentStore, Sublevel};
pub use error::{StorageError, StorageResult};
pub use traits::{BatchOp, KeyValueStore};

use hearth_core::config::StoreConfig;
use std::sync::Arc;

/// Create a key-value store from configuration.
pub async fn from_config(config: &StoreConfig) -> StorageResult<Arc<dyn KeyValueStore>> {
    match config {
        StoreConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
        StoreConfig::Memory => {
            tracing::warn!("Using the in-memory store, nothing will persist across restarts");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}

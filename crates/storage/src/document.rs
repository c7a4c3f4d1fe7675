//! Typed JSON documents on top of a [`KeyValueStore`].

use crate::error::{StorageError, StorageResult};
use crate::traits::{BatchOp, KeyValueStore};
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Handle to the document store.
///
/// Root-level documents are addressed by their plain key. Sublevels partition
/// the key space with a `!name!` prefix.
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn KeyValueStore>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Underlying key-value backend.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Read a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.backend.get(key).await? {
            Some(bytes) => decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Write a JSON document.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes = encode(key, value)?;
        self.backend.put(key, bytes).await
    }

    /// Read a raw UTF-8 value.
    pub async fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        match self.backend.get(key).await? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| StorageError::NotUtf8(key.to_string())),
            None => Ok(None),
        }
    }

    /// Write a raw UTF-8 value.
    pub async fn put_string(&self, key: &str, value: &str) -> StorageResult<()> {
        self.backend
            .put(key, Bytes::copy_from_slice(value.as_bytes()))
            .await
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.backend.delete(key).await
    }

    /// Open a typed sublevel.
    pub fn sublevel<V>(&self, name: &str) -> Sublevel<V> {
        Sublevel {
            backend: self.backend.clone(),
            prefix: format!("!{name}!"),
            _marker: PhantomData,
        }
    }
}

/// A partition of the store holding documents of one type.
pub struct Sublevel<V> {
    backend: Arc<dyn KeyValueStore>,
    prefix: String,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Clone for Sublevel<V> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            prefix: self.prefix.clone(),
            _marker: PhantomData,
        }
    }
}

impl<V: Serialize + DeserializeOwned> Sublevel<V> {
    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    pub async fn get(&self, key: &str) -> StorageResult<Option<V>> {
        let full_key = self.full_key(key);
        match self.backend.get(&full_key).await? {
            Some(bytes) => decode(&full_key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub async fn put(&self, key: &str, value: &V) -> StorageResult<()> {
        let full_key = self.full_key(key);
        let bytes = encode(&full_key, value)?;
        self.backend.put(&full_key, bytes).await
    }

    /// Write many documents as one backend batch.
    ///
    /// Encoding happens up front; nothing is written if any document fails to
    /// encode.
    pub async fn batch_put(&self, entries: Vec<(String, V)>) -> StorageResult<()> {
        let ops = entries
            .into_iter()
            .map(|(key, value)| {
                let full_key = self.full_key(&key);
                let bytes = encode(&full_key, &value)?;
                Ok(BatchOp::put(full_key, bytes))
            })
            .collect::<StorageResult<Vec<_>>>()?;
        if ops.is_empty() {
            return Ok(());
        }
        self.backend.batch(ops).await
    }

    /// All `(key, document)` pairs, ordered by key. Keys are returned without
    /// the sublevel prefix.
    pub async fn entries(&self) -> StorageResult<Vec<(String, V)>> {
        self.backend
            .scan(&self.prefix)
            .await?
            .into_iter()
            .map(|(full_key, bytes)| {
                let value = decode(&full_key, &bytes)?;
                let key = full_key[self.prefix.len()..].to_string();
                Ok((key, value))
            })
            .collect()
    }

    /// All documents, ordered by key.
    pub async fn values(&self) -> StorageResult<Vec<V>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> StorageResult<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(bytes).map_err(|source| StorageError::Decode {
        key: key.to_string(),
        source,
    })
}

//! Local filesystem storage backend.
//!
//! Every key is stored as one file directly under the root. Key bytes outside
//! `[a-z0-9_-]` are percent-encoded in the file name, so keys can never form a
//! path, never start with a dot, and keys differing only in case stay distinct
//! on case-insensitive filesystems. Temporary files start with `.tmp.` and are
//! ignored by scans.

use crate::error::{StorageError, StorageResult};
use crate::traits::{BatchOp, KeyValueStore, validate_key};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Common file name limit of Linux, macOS and Windows filesystems.
const MAX_FILE_NAME_LEN: usize = 255;

/// Local filesystem key-value store.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend, creating the root if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        let file_name = encode_file_name(key);
        if file_name.len() > MAX_FILE_NAME_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key encodes to a {}-byte file name (max: {MAX_FILE_NAME_LEN})",
                file_name.len()
            )));
        }
        Ok(self.root.join(file_name))
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        // Unique temp name so concurrent writers to the same key never share a file
        let temp_path = self.root.join(format!(".tmp.{}", Uuid::new_v4()));
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
        }
        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[async_trait]
impl KeyValueStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        let path = self.key_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    #[instrument(skip(self, value), fields(backend = "filesystem", size = value.len()))]
    async fn put(&self, key: &str, value: Bytes) -> StorageResult<()> {
        let path = self.key_path(key)?;
        self.write_atomic(&path, &value).await
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        self.remove(&path).await
    }

    #[instrument(skip(self, ops), fields(backend = "filesystem", ops = ops.len()))]
    async fn batch(&self, ops: Vec<BatchOp>) -> StorageResult<()> {
        let paths = ops
            .iter()
            .map(|op| self.key_path(op.key()))
            .collect::<StorageResult<Vec<_>>>()?;

        for (op, path) in ops.into_iter().zip(paths) {
            match op {
                BatchOp::Put { value, .. } => self.write_atomic(&path, &value).await?,
                BatchOp::Delete { .. } => self.remove(&path).await?,
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn scan(&self, prefix: &str) -> StorageResult<Vec<(String, Bytes)>> {
        let mut results = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            // Use file_type() instead of path.is_file() to avoid following symlinks.
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let Some(key) = decode_file_name(name) else {
                tracing::warn!(file = %name, "Skipping file with undecodable name in store root");
                continue;
            };
            if !key.starts_with(prefix) {
                continue;
            }
            match fs::read(entry.path()).await {
                Ok(data) => results.push((key, Bytes::from(data))),
                // Deleted between read_dir and read
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::Io(e)),
            }
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await?;
        if !metadata.is_dir() {
            return Err(StorageError::Config(format!(
                "store root is not a directory: {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}

fn encode_file_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn decode_file_name(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_encoding_round_trip() {
        for key in ["userPreferences", "!games!steam:1245620", "../etc/passwd", "é"] {
            let encoded = encode_file_name(key);
            assert!(!encoded.contains('/'));
            assert!(!encoded.starts_with('.'));
            assert_eq!(decode_file_name(&encoded).as_deref(), Some(key));
        }
    }

    #[test]
    fn test_file_names_differ_beyond_case() {
        let lower = encode_file_name("steam:abc");
        let upper = encode_file_name("steam:ABC");
        assert_ne!(lower.to_ascii_lowercase(), upper.to_ascii_lowercase());
        assert!(!encode_file_name("userPreferences").contains('P'));
    }

    #[test]
    fn test_decode_rejects_truncated_escape() {
        assert_eq!(decode_file_name("abc%2"), None);
        assert_eq!(decode_file_name("abc%zz"), None);
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        backend
            .put("!games!steam:1", Bytes::from("hello"))
            .await
            .unwrap();
        assert_eq!(
            backend.get("!games!steam:1").await.unwrap(),
            Some(Bytes::from("hello"))
        );

        backend.delete("!games!steam:1").await.unwrap();
        assert_eq!(backend.get("!games!steam:1").await.unwrap(), None);

        // Deleting again is fine
        backend.delete("!games!steam:1").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path().join("store")).await.unwrap();

        backend
            .put("../outside", Bytes::from("data"))
            .await
            .unwrap();

        assert!(!dir.path().join("outside").exists());
        assert_eq!(
            backend.get("../outside").await.unwrap(),
            Some(Bytes::from("data"))
        );
    }

    #[tokio::test]
    async fn test_scan_filters_prefix_and_skips_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        backend
            .batch(vec![
                BatchOp::put("!games!steam:2", Bytes::from("b")),
                BatchOp::put("!games!steam:1", Bytes::from("a")),
                BatchOp::put("!downloads!steam:1", Bytes::from("d")),
                BatchOp::put("userPreferences", Bytes::from("{}")),
            ])
            .await
            .unwrap();
        std::fs::write(dir.path().join(".tmp.leftover"), b"partial").unwrap();

        let games = backend.scan("!games!").await.unwrap();
        let keys: Vec<_> = games.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["!games!steam:1", "!games!steam:2"]);

        let all = backend.scan("").await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_mixed_case_keys_are_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        backend.put("!games!gog:Witcher", Bytes::from("a")).await.unwrap();
        backend.put("!games!gog:witcher", Bytes::from("b")).await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
        assert_eq!(
            backend.get("!games!gog:Witcher").await.unwrap(),
            Some(Bytes::from("a"))
        );
        assert_eq!(
            backend.get("!games!gog:witcher").await.unwrap(),
            Some(Bytes::from("b"))
        );
    }

    #[tokio::test]
    async fn test_key_too_long_for_a_file_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        // 100 bytes, each escaped to three
        let key = ":".repeat(100);
        let result = backend.put(&key, Bytes::from("x")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert_eq!(backend.get(&key).await.ok(), None);

        let fits = "k".repeat(MAX_FILE_NAME_LEN);
        backend.put(&fits, Bytes::from("x")).await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_validates_before_applying() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        let result = backend
            .batch(vec![
                BatchOp::put("valid", Bytes::from("1")),
                BatchOp::put("", Bytes::from("2")),
            ])
            .await;

        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert_eq!(backend.get("valid").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        backend.put("k", Bytes::from("first")).await.unwrap();
        backend.put("k", Bytes::from("second")).await.unwrap();

        assert_eq!(backend.get("k").await.unwrap(), Some(Bytes::from("second")));
        // Only the final file remains, no temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

// Consistency tests for concurrent writers on disjoint sublevels
// Ensures batches from independent writers never clobber each other

use bytes::Bytes;
use hearth_storage::traits::{BatchOp, KeyValueStore};
use hearth_storage::{FilesystemBackend, MemoryBackend};
use std::sync::Arc;
use tempfile::TempDir;

async fn concurrent_disjoint_batches(backend: Arc<dyn KeyValueStore>) {
    let mut handles = Vec::new();
    for sublevel in ["games", "gameAchievements", "downloads", "misc"] {
        let backend = backend.clone();
        handles.push(tokio::spawn(async move {
            let ops = (0..50)
                .map(|i| BatchOp::put(format!("!{sublevel}!steam:{i}"), Bytes::from(vec![i as u8])))
                .collect();
            backend.batch(ops).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for sublevel in ["games", "gameAchievements", "downloads", "misc"] {
        let entries = backend.scan(&format!("!{sublevel}!")).await.unwrap();
        assert_eq!(entries.len(), 50, "sublevel {sublevel} lost writes");
    }
    assert_eq!(backend.scan("").await.unwrap().len(), 200);
}

#[tokio::test]
async fn test_concurrent_disjoint_batches_filesystem() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FilesystemBackend::new(temp_dir.path()).await.unwrap();
    concurrent_disjoint_batches(Arc::new(backend)).await;
}

#[tokio::test]
async fn test_concurrent_disjoint_batches_memory() {
    concurrent_disjoint_batches(Arc::new(MemoryBackend::new())).await;
}

#[tokio::test]
async fn test_concurrent_puts_same_key_leave_one_value() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(FilesystemBackend::new(temp_dir.path()).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..20u8 {
        let backend = backend.clone();
        handles.push(tokio::spawn(async move {
            backend.put("sqliteMigrationDone", Bytes::from(vec![i])).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let value = backend.get("sqliteMigrationDone").await.unwrap().unwrap();
    assert_eq!(value.len(), 1);
    // No temp files left behind
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

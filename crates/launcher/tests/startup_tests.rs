//! Tests of the startup sequence with in-process collaborators.

mod common;

use common::{FakeDebridClient, Fakes, memory_store, test_cipher};
use hearth_core::documents::{Download, DownloadStatus, Downloader, UserPreferences};
use hearth_core::keys::{self, game_key, sublevels};
use hearth_crypto::SecretCipher;
use hearth_launcher::{LaunchError, Launcher, MigrationReport, Migrator, ReadyPreferences};
use hearth_storage::DocumentStore;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn download(object_id: &str, timestamp: i64) -> Download {
    Download {
        shop: "steam".to_string(),
        object_id: object_id.to_string(),
        uri: Some(format!("magnet:?xt=urn:btih:{object_id}")),
        folder_name: Some(object_id.to_string()),
        download_path: "/games".to_string(),
        progress: 0.25,
        downloader: Downloader::Torrent,
        bytes_downloaded: 0,
        file_size: None,
        status: DownloadStatus::Paused,
        should_seed: false,
        queued: false,
        timestamp,
    }
}

async fn put_downloads(store: &DocumentStore, downloads: Vec<Download>) {
    let entries = downloads
        .into_iter()
        .map(|d| (game_key(&d.shop, &d.object_id), d))
        .collect();
    store
        .sublevel::<Download>(sublevels::DOWNLOADS)
        .batch_put(entries)
        .await
        .unwrap();
}

/// A settled report for a store with no legacy database.
async fn settled(store: &DocumentStore) -> MigrationReport {
    Migrator::new(store.clone(), test_cipher(), None)
        .run_migration()
        .await
        .unwrap()
}

#[tokio::test]
async fn runs_every_step_in_order() {
    let store = memory_store();
    let cipher = test_cipher();
    let report = settled(&store).await;
    store
        .put_json(
            keys::USER_PREFERENCES,
            &UserPreferences {
                real_debrid_api_token: Some(cipher.encrypt("rd-plain").unwrap()),
                tor_box_api_token: Some(cipher.encrypt("tb-plain").unwrap()),
                ..UserPreferences::default()
            },
        )
        .await
        .unwrap();

    let fakes = Fakes::default();
    let launcher = Launcher::new(store, cipher, fakes.collaborators());
    launcher.load_state(&report).await.unwrap();

    assert_eq!(fakes.real_debrid.tokens(), vec!["rd-plain".to_string()]);
    assert!(fakes.all_debrid.tokens().is_empty());
    assert_eq!(fakes.torbox.tokens(), vec!["tb-plain".to_string()]);
    assert_eq!(fakes.registrar.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.engine.calls.lock().unwrap().len(), 1);
    assert_eq!(fakes.main_loop.starts.load(Ordering::SeqCst), 1);

    launcher.tasks().wait().await;
    assert_eq!(fakes.agent.runs.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.sync.setups.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.sync.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.real_debrid.verifications.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.all_debrid.verifications.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.torbox.verifications.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resumes_most_recent_queued_download() {
    let store = memory_store();
    let report = settled(&store).await;
    put_downloads(
        &store,
        vec![
            Download {
                queued: true,
                ..download("t1", 1)
            },
            Download {
                queued: true,
                ..download("t3", 3)
            },
            download("t2", 2),
        ],
    )
    .await;

    let fakes = Fakes::default();
    let launcher = Launcher::new(store, test_cipher(), fakes.collaborators());
    launcher.load_state(&report).await.unwrap();

    let calls = fakes.engine.calls.lock().unwrap();
    let (next, seeds) = &calls[0];
    assert_eq!(next.as_ref().map(|d| d.object_id.as_str()), Some("t3"));
    assert!(seeds.is_empty());
}

#[tokio::test]
async fn seeds_come_from_every_download() {
    let store = memory_store();
    let report = settled(&store).await;
    let complete = |id: &str| Download {
        should_seed: true,
        progress: 1.0,
        status: DownloadStatus::Complete,
        ..download(id, 0)
    };
    put_downloads(
        &store,
        vec![
            complete("a-seed"),
            Download {
                progress: 0.9,
                ..complete("b-partial")
            },
            Download {
                uri: None,
                ..complete("c-no-uri")
            },
            Download {
                downloader: Downloader::Gofile,
                ..complete("d-http")
            },
        ],
    )
    .await;

    let fakes = Fakes::default();
    Launcher::new(store, test_cipher(), fakes.collaborators())
        .load_state(&report)
        .await
        .unwrap();

    let calls = fakes.engine.calls.lock().unwrap();
    let (next, seeds) = &calls[0];
    assert!(next.is_none());
    let ids: Vec<_> = seeds.iter().map(|d| d.object_id.as_str()).collect();
    assert_eq!(ids, vec!["a-seed"]);
}

#[tokio::test]
async fn empty_queue_still_starts_engine() {
    let store = memory_store();
    let report = settled(&store).await;

    let fakes = Fakes::default();
    Launcher::new(store, test_cipher(), fakes.collaborators())
        .load_state(&report)
        .await
        .unwrap();

    let calls = fakes.engine.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.is_none());
    assert!(calls[0].1.is_empty());
    assert_eq!(fakes.main_loop.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn isolated_failures_do_not_stop_startup() {
    let store = memory_store();
    let cipher = test_cipher();
    let report = settled(&store).await;
    store
        .put_json(
            keys::USER_PREFERENCES,
            &UserPreferences {
                real_debrid_api_token: Some(cipher.encrypt("rd").unwrap()),
                // Not a ciphertext: decryption fails for this provider only
                all_debrid_api_key: Some("plain-key".to_string()),
                tor_box_api_token: Some(cipher.encrypt("tb").unwrap()),
                ..UserPreferences::default()
            },
        )
        .await
        .unwrap();

    let mut fakes = Fakes::default();
    fakes.real_debrid = FakeDebridClient::rejecting(hearth_launcher::DebridProvider::RealDebrid);
    fakes.registrar = Arc::new(common::FakeRegistrar {
        fail: true,
        ..Default::default()
    });
    fakes.sync = Arc::new(common::FakeSync {
        fail_setup: true,
        ..Default::default()
    });

    let launcher = Launcher::new(store, cipher, fakes.collaborators());
    launcher.load_state(&report).await.unwrap();

    assert!(fakes.real_debrid.tokens().is_empty());
    assert!(fakes.all_debrid.tokens().is_empty());
    assert_eq!(fakes.torbox.tokens(), vec!["tb".to_string()]);
    assert_eq!(fakes.engine.calls.lock().unwrap().len(), 1);
    assert_eq!(fakes.main_loop.starts.load(Ordering::SeqCst), 1);

    // The detached sync stops after the failed setup, without reaching the caller
    launcher.tasks().wait().await;
    assert_eq!(fakes.sync.setups.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.sync.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn engine_failure_still_starts_main_loop() {
    let store = memory_store();
    let report = settled(&store).await;

    let mut fakes = Fakes::default();
    fakes.engine = Arc::new(common::FakeEngine {
        fail: true,
        ..Default::default()
    });

    let result = Launcher::new(store, test_cipher(), fakes.collaborators())
        .load_state(&report)
        .await;
    result.unwrap();
    assert_eq!(fakes.engine.calls.lock().unwrap().len(), 1);
    assert_eq!(fakes.main_loop.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreadable_downloads_are_fatal() {
    let store = memory_store();
    let report = settled(&store).await;
    store
        .put_string("!downloads!steam:1", "not json")
        .await
        .unwrap();

    let fakes = Fakes::default();
    let result = Launcher::new(store, test_cipher(), fakes.collaborators())
        .load_state(&report)
        .await;
    assert!(matches!(result, Err(LaunchError::Storage(_))));
    assert!(fakes.engine.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_preferences_fall_back_to_defaults() {
    let store = memory_store();
    let report = settled(&store).await;

    let ready = ReadyPreferences::load(&store, &report).await.unwrap();
    assert_eq!(ready.preferences(), &UserPreferences::default());
    for provider in hearth_launcher::DebridProvider::ALL {
        assert!(ready.credential(provider).is_none());
    }
}

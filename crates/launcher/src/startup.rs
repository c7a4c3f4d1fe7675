//! Startup sequencing after the legacy migration has settled.

use crate::detached::DetachedTasks;
use crate::error::LaunchResult;
use crate::metrics::{self, PROVIDER_AUTHORIZATIONS};
use crate::migration::MigrationReport;
use crate::providers::{DebridClients, DebridProvider};
use crate::services::{DownloadAgent, DownloadEngine, MainLoop, ManifestRegistrar, RemoteSync};
use futures::future::join_all;
use hearth_core::documents::{Download, Downloader, UserPreferences};
use hearth_core::keys::{self, game_key, sublevels};
use hearth_crypto::SecretCipher;
use hearth_storage::DocumentStore;
use std::sync::Arc;

/// User preferences read after the migration settled.
///
/// Building one requires a [`MigrationReport`], so provider authorization
/// cannot run against a store the migration has not written yet.
#[derive(Clone, Debug)]
pub struct ReadyPreferences {
    preferences: UserPreferences,
}

impl ReadyPreferences {
    /// Read the preferences document. A missing document yields defaults.
    pub async fn load(store: &DocumentStore, report: &MigrationReport) -> LaunchResult<Self> {
        let preferences = store
            .get_json::<UserPreferences>(keys::USER_PREFERENCES)
            .await?;
        tracing::debug!(
            found = preferences.is_some(),
            migrated_now = !report.was_already_done(),
            "Loaded user preferences"
        );
        Ok(Self {
            preferences: preferences.unwrap_or_default(),
        })
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Encrypted credential stored for `provider`, if any.
    pub fn credential(&self, provider: DebridProvider) -> Option<&str> {
        let value = match provider {
            DebridProvider::RealDebrid => &self.preferences.real_debrid_api_token,
            DebridProvider::AllDebrid => &self.preferences.all_debrid_api_key,
            DebridProvider::TorBox => &self.preferences.tor_box_api_token,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Downloads to hand to the engine at startup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DownloadPlan {
    /// Most recent queued download.
    pub next: Option<Download>,
    /// Completed torrents that keep seeding.
    pub seeds: Vec<Download>,
}

/// Pick the download to resume and the seed set.
///
/// The next item is the queued download with the highest timestamp. Seeds
/// come from every download, queued or not.
pub fn plan_downloads(downloads: Vec<Download>) -> DownloadPlan {
    let next = downloads
        .iter()
        .filter(|download| download.queued)
        // max_by_key keeps the last maximum; reverse so ties go to the first
        .rev()
        .max_by_key(|download| download.timestamp)
        .cloned();
    let seeds = downloads.into_iter().filter(is_seed_candidate).collect();
    DownloadPlan { next, seeds }
}

fn is_seed_candidate(download: &Download) -> bool {
    download.should_seed
        && download.downloader == Downloader::Torrent
        && download.progress == 1.0
        && download.uri.is_some()
}

/// Collaborators driven by the [`Launcher`].
pub struct Collaborators {
    pub providers: DebridClients,
    pub agent: Arc<dyn DownloadAgent>,
    pub engine: Arc<dyn DownloadEngine>,
    pub sync: Arc<dyn RemoteSync>,
    pub registrar: Arc<dyn ManifestRegistrar>,
    pub main_loop: Arc<dyn MainLoop>,
}

/// Brings the application to its running state.
pub struct Launcher {
    store: DocumentStore,
    cipher: Arc<dyn SecretCipher>,
    services: Collaborators,
    tasks: DetachedTasks,
}

impl Launcher {
    pub fn new(
        store: DocumentStore,
        cipher: Arc<dyn SecretCipher>,
        services: Collaborators,
    ) -> Self {
        Self {
            store,
            cipher,
            services,
            tasks: DetachedTasks::new(),
        }
    }

    /// Detached tasks spawned during startup.
    pub fn tasks(&self) -> &DetachedTasks {
        &self.tasks
    }

    pub fn providers(&self) -> &DebridClients {
        &self.services.providers
    }

    /// Run the startup sequence and then the main loop.
    ///
    /// Returns when the main loop stops. Only failing to read preferences or
    /// downloads, or a main loop failure, is returned; every other step logs
    /// and carries on.
    pub async fn load_state(&self, report: &MigrationReport) -> LaunchResult<()> {
        let preferences = ReadyPreferences::load(&self.store, report).await?;

        metrics::register_metrics();

        let agent = self.services.agent.clone();
        self.tasks
            .spawn("download-agent", async move { agent.run().await });

        self.authorize_providers(&preferences).await;

        if let Err(e) = self.services.registrar.add_manifest_to_config().await {
            metrics::record_step_failure("backup_manifest");
            tracing::warn!(error = %e, "Failed to register backup manifest");
        }

        let sync = self.services.sync.clone();
        self.tasks.spawn("library-sync", async move {
            sync.setup_api().await?;
            sync.upload_games_batch().await?;
            Ok(())
        });

        let downloads = self
            .store
            .sublevel::<Download>(sublevels::DOWNLOADS)
            .values()
            .await?;
        let plan = plan_downloads(downloads);
        tracing::info!(
            next = ?plan.next.as_ref().map(|d| game_key(&d.shop, &d.object_id)),
            seeds = plan.seeds.len(),
            "Starting download engine"
        );

        if let Err(e) = self
            .services
            .engine
            .start_rpc(plan.next.as_ref(), &plan.seeds, &self.services.providers)
            .await
        {
            metrics::record_step_failure("download_engine");
            tracing::error!(error = %e, "Download engine failed to start, downloads stay paused");
        }

        self.services.main_loop.start().await
    }

    /// Authorize every provider with a stored credential. Providers are
    /// independent; returns those that ended up authorized. Each token is
    /// then verified with its provider in a detached task.
    pub async fn authorize_providers(&self, preferences: &ReadyPreferences) -> Vec<DebridProvider> {
        let attempts = DebridProvider::ALL.into_iter().filter_map(|provider| {
            let sealed = preferences.credential(provider)?;
            let client = self.services.providers.get(provider)?.clone();
            Some(async move {
                let result = match self.cipher.decrypt(sealed) {
                    Ok(token) => client.authorize(&token).await,
                    Err(e) => Err(e.into()),
                };
                match result {
                    Ok(()) => {
                        PROVIDER_AUTHORIZATIONS
                            .with_label_values(&[provider.as_str(), "authorized"])
                            .inc();
                        tracing::info!(provider = %provider, "Provider authorized");
                        // Offline starts keep the token; a rejected one only shows up here
                        let verifier = client.clone();
                        self.tasks
                            .spawn("provider-verify", async move { verifier.verify().await });
                        Some(provider)
                    }
                    Err(e) => {
                        PROVIDER_AUTHORIZATIONS
                            .with_label_values(&[provider.as_str(), "failed"])
                            .inc();
                        tracing::warn!(provider = %provider, error = %e, "Provider authorization failed");
                        None
                    }
                }
            })
        });

        join_all(attempts).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::documents::DownloadStatus;

    fn download(object_id: &str, timestamp: i64) -> Download {
        Download {
            shop: "steam".to_string(),
            object_id: object_id.to_string(),
            uri: Some(format!("magnet:?xt=urn:btih:{object_id}")),
            folder_name: None,
            download_path: "/games".to_string(),
            progress: 0.5,
            downloader: Downloader::Torrent,
            bytes_downloaded: 0,
            file_size: None,
            status: DownloadStatus::Paused,
            should_seed: false,
            queued: false,
            timestamp,
        }
    }

    fn queued(object_id: &str, timestamp: i64) -> Download {
        Download {
            queued: true,
            ..download(object_id, timestamp)
        }
    }

    fn seedable(object_id: &str) -> Download {
        Download {
            should_seed: true,
            progress: 1.0,
            status: DownloadStatus::Seeding,
            ..download(object_id, 0)
        }
    }

    #[test]
    fn test_next_is_most_recent_queued() {
        let plan = plan_downloads(vec![
            queued("t1", 1),
            queued("t3", 3),
            download("t2", 2),
        ]);
        assert_eq!(plan.next.map(|d| d.object_id), Some("t3".to_string()));
    }

    #[test]
    fn test_unqueued_download_never_next() {
        let plan = plan_downloads(vec![download("t9", 9)]);
        assert!(plan.next.is_none());
    }

    #[test]
    fn test_timestamp_tie_keeps_first() {
        let plan = plan_downloads(vec![queued("a", 5), queued("b", 5)]);
        assert_eq!(plan.next.map(|d| d.object_id), Some("a".to_string()));
    }

    #[test]
    fn test_seed_selection() {
        let mut partial = seedable("partial");
        partial.progress = 0.9;
        let mut no_uri = seedable("no-uri");
        no_uri.uri = None;
        let mut http = seedable("http");
        http.downloader = Downloader::Gofile;
        let mut no_seed = seedable("no-seed");
        no_seed.should_seed = false;
        let mut queued_seed = seedable("queued");
        queued_seed.queued = true;

        let plan = plan_downloads(vec![
            seedable("ok"),
            partial,
            no_uri,
            http,
            no_seed,
            queued_seed,
        ]);
        let ids: Vec<_> = plan.seeds.iter().map(|d| d.object_id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "queued"]);
    }

    #[test]
    fn test_empty_downloads() {
        assert_eq!(plan_downloads(Vec::new()), DownloadPlan::default());
    }
}

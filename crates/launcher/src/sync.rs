//! Remote library sync over the Hydra API.

use crate::error::{LaunchError, LaunchResult};
use crate::metrics::GAMES_UPLOADED;
use crate::services::RemoteSync;
use async_trait::async_trait;
use hearth_core::config::SyncConfig;
use hearth_core::documents::{Auth, Game};
use hearth_core::keys::{self, sublevels};
use hearth_crypto::SecretCipher;
use hearth_storage::DocumentStore;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Entry of a library batch upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameUpload<'a> {
    object_id: &'a str,
    shop: &'a str,
    play_time_in_milliseconds: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    last_time_played: Option<OffsetDateTime>,
}

pub struct LibrarySyncClient {
    http: reqwest::Client,
    base_url: Url,
    batch_size: usize,
    store: DocumentStore,
    cipher: Arc<dyn SecretCipher>,
    access_token: RwLock<Option<String>>,
}

impl LibrarySyncClient {
    pub fn new(
        config: &SyncConfig,
        store: DocumentStore,
        cipher: Arc<dyn SecretCipher>,
    ) -> LaunchResult<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| LaunchError::Config(format!("invalid sync API URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url,
            batch_size: config.batch_size.max(1),
            store,
            cipher,
            access_token: RwLock::new(None),
        })
    }

    pub async fn is_logged_in(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    async fn upload_batch(&self, token: &str, games: &[Game]) -> LaunchResult<()> {
        let url = self
            .base_url
            .join("profile/games/batch")
            .map_err(|e| LaunchError::Config(format!("failed to build sync URL: {e}")))?;
        let body: Vec<_> = games
            .iter()
            .map(|game| GameUpload {
                object_id: &game.object_id,
                shop: &game.shop,
                play_time_in_milliseconds: game.play_time_in_milliseconds,
                last_time_played: game.last_time_played,
            })
            .collect();

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LaunchError::Sync(format!("API error ({status}): {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSync for LibrarySyncClient {
    async fn setup_api(&self) -> LaunchResult<()> {
        let Some(auth) = self.store.get_json::<Auth>(keys::AUTH).await? else {
            tracing::info!("No signed-in user, library sync disabled");
            return Ok(());
        };

        let now = OffsetDateTime::now_utc().unix_timestamp() * 1000;
        if auth.token_expiration_timestamp > 0 && auth.token_expiration_timestamp < now {
            tracing::warn!("Stored access token has expired, remote sync may be rejected");
        }

        let access_token = self.cipher.decrypt(&auth.access_token)?;
        *self.access_token.write().await = Some(access_token);
        tracing::debug!("Remote API session restored");
        Ok(())
    }

    async fn upload_games_batch(&self) -> LaunchResult<usize> {
        let Some(token) = self.access_token.read().await.clone() else {
            tracing::debug!("Not logged in, skipping library upload");
            return Ok(0);
        };

        let games: Vec<Game> = self
            .store
            .sublevel::<Game>(sublevels::GAMES)
            .values()
            .await?
            .into_iter()
            .filter(|game| !game.is_deleted)
            .collect();

        for chunk in games.chunks(self.batch_size) {
            self.upload_batch(&token, chunk).await?;
            GAMES_UPLOADED.inc_by(chunk.len() as u64);
        }

        tracing::info!(games = games.len(), "Library uploaded");
        Ok(games.len())
    }
}

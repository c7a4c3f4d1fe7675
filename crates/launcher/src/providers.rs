//! Debrid provider clients.
//!
//! Each provider gets its own client object owned by the startup context.
//! A client starts unauthorized; [`DebridClient::authorize`] installs the
//! token locally, so a provider stays usable when it cannot be reached at
//! startup. [`DebridClient::verify`] checks the installed token against the
//! provider and never revokes it.

use crate::error::{LaunchError, LaunchResult};
use async_trait::async_trait;
use hearth_core::config::ProvidersConfig;
use hearth_core::documents::Downloader;
use reqwest::Url;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Debrid services that need an authorized client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DebridProvider {
    RealDebrid,
    AllDebrid,
    TorBox,
}

impl DebridProvider {
    pub const ALL: [DebridProvider; 3] = [Self::RealDebrid, Self::AllDebrid, Self::TorBox];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RealDebrid => "real_debrid",
            Self::AllDebrid => "all_debrid",
            Self::TorBox => "torbox",
        }
    }

    /// The downloader kind served by this provider.
    pub fn downloader(self) -> Downloader {
        match self {
            Self::RealDebrid => Downloader::RealDebrid,
            Self::AllDebrid => Downloader::AllDebrid,
            Self::TorBox => Downloader::TorBox,
        }
    }

    /// The provider behind a downloader kind, if any.
    pub fn for_downloader(downloader: Downloader) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.downloader() == downloader)
    }

    fn user_path(self) -> &'static str {
        match self {
            Self::RealDebrid | Self::AllDebrid => "user",
            Self::TorBox => "user/me",
        }
    }
}

impl fmt::Display for DebridProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Client of one debrid provider.
#[async_trait]
pub trait DebridClient: Send + Sync {
    fn provider(&self) -> DebridProvider;

    /// Authorize the client with a decrypted token. Local only; re-authorizing
    /// replaces the previous token.
    async fn authorize(&self, token: &str) -> LaunchResult<()>;

    fn is_authorized(&self) -> bool;

    /// Check the installed token with the provider.
    async fn verify(&self) -> LaunchResult<()> {
        Ok(())
    }
}

/// HTTP client of a debrid provider API.
pub struct HttpDebridClient {
    provider: DebridProvider,
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpDebridClient {
    pub fn new(provider: DebridProvider, base_url: &str, timeout: Duration) -> LaunchResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LaunchError::Config(format!("invalid {provider} URL {base_url}: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            provider,
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Token the client was authorized with.
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|token| token.clone())
    }
}

#[async_trait]
impl DebridClient for HttpDebridClient {
    fn provider(&self) -> DebridProvider {
        self.provider
    }

    async fn authorize(&self, token: &str) -> LaunchResult<()> {
        let mut guard = self.token.write().map_err(|_| LaunchError::Authorization {
            provider: self.provider.to_string(),
            message: "token lock poisoned".to_string(),
        })?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn is_authorized(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    async fn verify(&self) -> LaunchResult<()> {
        let Some(token) = self.token() else {
            return Err(LaunchError::Authorization {
                provider: self.provider.to_string(),
                message: "no token installed".to_string(),
            });
        };
        let url = self.base_url.join(self.provider.user_path()).map_err(|e| {
            LaunchError::Config(format!("failed to build {} URL: {e}", self.provider))
        })?;
        let response = self.http.get(url).bearer_auth(&token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LaunchError::Authorization {
                provider: self.provider.to_string(),
                message: format!("{status}: {body}"),
            });
        }
        Ok(())
    }
}

/// The three provider clients of one process.
#[derive(Clone)]
pub struct DebridClients {
    clients: BTreeMap<DebridProvider, Arc<dyn DebridClient>>,
}

impl DebridClients {
    pub fn new(
        real_debrid: Arc<dyn DebridClient>,
        all_debrid: Arc<dyn DebridClient>,
        torbox: Arc<dyn DebridClient>,
    ) -> Self {
        let clients = [real_debrid, all_debrid, torbox]
            .into_iter()
            .map(|client| (client.provider(), client))
            .collect();
        Self { clients }
    }

    pub fn from_config(config: &ProvidersConfig) -> LaunchResult<Self> {
        let timeout = config.timeout();
        Ok(Self::new(
            Arc::new(HttpDebridClient::new(
                DebridProvider::RealDebrid,
                &config.real_debrid_url,
                timeout,
            )?),
            Arc::new(HttpDebridClient::new(
                DebridProvider::AllDebrid,
                &config.all_debrid_url,
                timeout,
            )?),
            Arc::new(HttpDebridClient::new(
                DebridProvider::TorBox,
                &config.torbox_url,
                timeout,
            )?),
        ))
    }

    pub fn get(&self, provider: DebridProvider) -> Option<&Arc<dyn DebridClient>> {
        self.clients.get(&provider)
    }

    /// Whether the client serving `downloader` is authorized. Downloaders
    /// without a debrid provider need no authorization.
    pub fn can_serve(&self, downloader: Downloader) -> bool {
        match DebridProvider::for_downloader(downloader) {
            Some(provider) => self.get(provider).is_some_and(|c| c.is_authorized()),
            None => true,
        }
    }
}

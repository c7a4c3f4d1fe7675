//! Wiring of configured components.

use crate::agent::{Aria2Agent, ExternalAgent};
use crate::engine::Aria2Engine;
use crate::main_loop::SignalLoop;
use crate::manifest::LudusaviRegistrar;
use crate::migration::Migrator;
use crate::providers::DebridClients;
use crate::services::{DownloadAgent, RemoteSync};
use crate::startup::{Collaborators, Launcher};
use crate::sync::LibrarySyncClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use hearth_core::config::AppConfig;
use hearth_crypto::SecretCipher;
use hearth_storage::DocumentStore;
use std::sync::Arc;

/// Store and cipher shared by the migrator and the launcher.
#[derive(Clone)]
pub struct Foundation {
    pub store: DocumentStore,
    pub cipher: Arc<dyn SecretCipher>,
}

/// Open the document store and load the secret cipher.
pub async fn open_foundation(config: &AppConfig) -> Result<Foundation> {
    let backend = hearth_storage::from_config(&config.store)
        .await
        .context("failed to initialize document store")?;
    backend
        .health_check()
        .await
        .context("document store health check failed")?;
    tracing::info!(backend = backend.backend_name(), "Document store ready");

    let cipher = hearth_crypto::from_config(&config.cipher).context("failed to load cipher key")?;
    Ok(Foundation {
        store: DocumentStore::new(backend),
        cipher: Arc::new(cipher),
    })
}

/// Build the migrator, opening the legacy database if there is one.
pub async fn migrator(config: &AppConfig, foundation: &Foundation) -> Result<Migrator> {
    let source = hearth_legacy::from_config(&config.legacy)
        .await
        .context("failed to open legacy database")?;
    if let Some(source) = &source {
        source
            .health_check()
            .await
            .context("legacy database health check failed")?;
    }
    Ok(Migrator::new(
        foundation.store.clone(),
        foundation.cipher.clone(),
        source,
    ))
}

/// Build the launcher with the concrete collaborators.
pub fn launcher(config: &AppConfig, foundation: &Foundation) -> Result<Launcher> {
    let agent: Arc<dyn DownloadAgent> = if config.agent.enabled {
        Arc::new(Aria2Agent::new(&config.agent))
    } else {
        Arc::new(ExternalAgent)
    };

    let sync: Arc<dyn RemoteSync> = if config.sync.enabled {
        Arc::new(
            LibrarySyncClient::new(
                &config.sync,
                foundation.store.clone(),
                foundation.cipher.clone(),
            )
            .context("failed to build library sync client")?,
        )
    } else {
        Arc::new(DisabledSync)
    };

    let services = Collaborators {
        providers: DebridClients::from_config(&config.providers)
            .context("failed to build provider clients")?,
        agent,
        engine: Arc::new(
            Aria2Engine::from_config(&config.agent).context("failed to build download engine")?,
        ),
        sync,
        registrar: Arc::new(LudusaviRegistrar::new(&config.backup)),
        main_loop: Arc::new(SignalLoop::new(config.main_loop.tick_interval())),
    };

    Ok(Launcher::new(
        foundation.store.clone(),
        foundation.cipher.clone(),
        services,
    ))
}

struct DisabledSync;

#[async_trait]
impl RemoteSync for DisabledSync {
    async fn setup_api(&self) -> crate::error::LaunchResult<()> {
        tracing::info!("Remote library sync disabled");
        Ok(())
    }

    async fn upload_games_batch(&self) -> crate::error::LaunchResult<usize> {
        Ok(0)
    }
}

//! Contracts of the collaborators driven at startup.

use crate::error::LaunchResult;
use crate::providers::DebridClients;
use async_trait::async_trait;
use hearth_core::documents::Download;

/// Background download agent process.
#[async_trait]
pub trait DownloadAgent: Send + Sync {
    /// Run the agent until it exits. The sequencer detaches this call.
    async fn run(&self) -> LaunchResult<()>;
}

/// Download engine driven over RPC.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Resume `next` (if any) and re-enter seeding for `seeds`.
    async fn start_rpc(
        &self,
        next: Option<&Download>,
        seeds: &[Download],
        providers: &DebridClients,
    ) -> LaunchResult<()>;
}

/// Remote library sync API.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Restore the API session from the stored auth document.
    async fn setup_api(&self) -> LaunchResult<()>;

    /// Upload the local library. Returns the number of games uploaded.
    async fn upload_games_batch(&self) -> LaunchResult<usize>;
}

/// Registers the game-save manifest with the backup tool.
#[async_trait]
pub trait ManifestRegistrar: Send + Sync {
    async fn add_manifest_to_config(&self) -> LaunchResult<()>;
}

/// Steady-state process loop.
#[async_trait]
pub trait MainLoop: Send + Sync {
    /// Run until shutdown is requested.
    async fn start(&self) -> LaunchResult<()>;
}

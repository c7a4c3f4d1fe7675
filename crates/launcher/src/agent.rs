//! aria2 download agent process.

use crate::error::{LaunchError, LaunchResult};
use crate::services::DownloadAgent;
use async_trait::async_trait;
use hearth_core::config::AgentConfig;
use std::path::PathBuf;
use tokio::process::Command;

/// Runs `aria2c` with its JSON-RPC interface enabled.
pub struct Aria2Agent {
    binary: PathBuf,
    rpc_port: u16,
    rpc_secret: Option<String>,
}

impl Aria2Agent {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            rpc_port: config.rpc_port,
            rpc_secret: config.rpc_secret.clone(),
        }
    }

    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--enable-rpc".to_string(),
            "--rpc-listen-all=false".to_string(),
            format!("--rpc-listen-port={}", self.rpc_port),
            "--file-allocation=none".to_string(),
        ];
        if let Some(secret) = &self.rpc_secret {
            args.push(format!("--rpc-secret={secret}"));
        }
        args
    }
}

#[async_trait]
impl DownloadAgent for Aria2Agent {
    async fn run(&self) -> LaunchResult<()> {
        tracing::info!(
            binary = %self.binary.display(),
            rpc_port = self.rpc_port,
            "Starting download agent"
        );

        let mut child = Command::new(&self.binary)
            .args(self.args())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LaunchError::Agent(format!("failed to spawn {}: {e}", self.binary.display()))
            })?;

        let status = child.wait().await?;
        if !status.success() {
            return Err(LaunchError::Agent(format!(
                "{} exited with {status}",
                self.binary.display()
            )));
        }
        tracing::info!("Download agent exited");
        Ok(())
    }
}

/// Stand-in used when the agent is managed outside this process.
pub struct ExternalAgent;

#[async_trait]
impl DownloadAgent for ExternalAgent {
    async fn run(&self) -> LaunchResult<()> {
        tracing::info!("Download agent disabled, expecting an externally managed aria2");
        Ok(())
    }
}

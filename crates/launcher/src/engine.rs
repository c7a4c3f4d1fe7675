//! aria2 download engine driven over JSON-RPC.

use crate::error::{LaunchError, LaunchResult};
use crate::providers::DebridClients;
use crate::services::DownloadEngine;
use async_trait::async_trait;
use hearth_core::config::AgentConfig;
use hearth_core::documents::Download;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const READY_ATTEMPTS: u32 = 20;
const READY_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct Aria2Engine {
    http: reqwest::Client,
    rpc_url: String,
    secret: Option<String>,
}

impl Aria2Engine {
    pub fn new(rpc_url: impl Into<String>, secret: Option<String>) -> LaunchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            secret,
        })
    }

    pub fn from_config(config: &AgentConfig) -> LaunchResult<Self> {
        Self::new(config.rpc_url(), config.rpc_secret.clone())
    }

    async fn call(&self, method: &str, mut params: Vec<Value>) -> LaunchResult<Value> {
        if let Some(secret) = &self.secret {
            params.insert(0, Value::String(format!("token:{secret}")));
        }
        let body = json!({
            "jsonrpc": "2.0",
            "id": uuid::Uuid::new_v4().to_string(),
            "method": method,
            "params": params,
        });

        let response: RpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        if let Some(error) = response.error {
            return Err(LaunchError::Engine(format!(
                "{method} failed ({}): {}",
                error.code, error.message
            )));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Wait for the freshly spawned agent to accept RPC calls.
    async fn wait_ready(&self) -> LaunchResult<()> {
        let mut last_error = None;
        for _ in 0..READY_ATTEMPTS {
            match self.call("aria2.getVersion", Vec::new()).await {
                Ok(_) => return Ok(()),
                Err(LaunchError::Http(e)) if e.is_connect() => {
                    last_error = Some(e);
                    tokio::time::sleep(READY_INTERVAL).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(LaunchError::Engine(format!(
            "agent not reachable at {}: {}",
            self.rpc_url,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn add_uri(&self, download: &Download, seeding: bool) -> LaunchResult<String> {
        let Some(uri) = download.uri.as_deref() else {
            return Err(LaunchError::Engine(format!(
                "{}:{} has no uri",
                download.shop, download.object_id
            )));
        };
        let mut options = json!({ "dir": download.download_path });
        if seeding {
            options["check-integrity"] = json!("true");
        }
        let gid = self
            .call("aria2.addUri", vec![json!([uri]), options])
            .await?;
        Ok(gid.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl DownloadEngine for Aria2Engine {
    async fn start_rpc(
        &self,
        next: Option<&Download>,
        seeds: &[Download],
        providers: &DebridClients,
    ) -> LaunchResult<()> {
        let next = next.filter(|download| {
            let ready = download.uri.is_some() && providers.can_serve(download.downloader);
            if !ready {
                tracing::warn!(
                    shop = %download.shop,
                    object_id = %download.object_id,
                    downloader = download.downloader.as_str(),
                    "Queued download cannot be resumed yet"
                );
            }
            ready
        });
        if next.is_none() && seeds.is_empty() {
            tracing::debug!("Nothing to resume or seed");
            return Ok(());
        }

        self.wait_ready().await?;

        if let Some(download) = next {
            let gid = self.add_uri(download, false).await?;
            tracing::info!(
                shop = %download.shop,
                object_id = %download.object_id,
                gid = %gid,
                "Resumed queued download"
            );
        }
        for seed in seeds {
            let gid = self.add_uri(seed, true).await?;
            tracing::debug!(shop = %seed.shop, object_id = %seed.object_id, gid = %gid, "Seeding");
        }
        if !seeds.is_empty() {
            tracing::info!(count = seeds.len(), "Resumed seeding");
        }
        Ok(())
    }
}

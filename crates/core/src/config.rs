//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Legacy SQLite database configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Path of the legacy database file. Migration is skipped if it does not exist.
    #[serde(default = "default_legacy_path")]
    pub path: PathBuf,
    /// How long to wait on a locked database before failing, in seconds.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_legacy_path() -> PathBuf {
    PathBuf::from("./data/hydra.db")
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            path: default_legacy_path(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl LegacyConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

/// Document store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// One file per document under a root directory.
    Filesystem {
        /// Root directory for documents.
        path: PathBuf,
    },
    /// Volatile in-process store. Everything is lost on exit.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/store"),
        }
    }
}

/// Source of the key used to encrypt secrets at rest.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CipherKeyConfig {
    /// Key stored in a file (base64, 32 bytes).
    File {
        /// Path to the key file.
        path: PathBuf,
    },
    /// Key stored in an environment variable (base64, 32 bytes).
    Env {
        /// Environment variable name.
        var: String,
    },
    /// Key provided directly as a value (NOT recommended for production).
    Value {
        /// Base64 encoded key.
        key: String,
    },
    /// Generate a random key for this process (for development only).
    /// Secrets written with it cannot be read after a restart.
    Generate,
}

impl Default for CipherKeyConfig {
    fn default() -> Self {
        Self::File {
            path: PathBuf::from("./data/secret.key"),
        }
    }
}

/// Debrid provider API endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_real_debrid_url")]
    pub real_debrid_url: String,
    #[serde(default = "default_all_debrid_url")]
    pub all_debrid_url: String,
    #[serde(default = "default_torbox_url")]
    pub torbox_url: String,
    /// HTTP timeout for provider requests, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_real_debrid_url() -> String {
    "https://api.real-debrid.com/rest/1.0/".to_string()
}

fn default_all_debrid_url() -> String {
    "https://api.alldebrid.com/v4/".to_string()
}

fn default_torbox_url() -> String {
    "https://api.torbox.app/v1/api/".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            real_debrid_url: default_real_debrid_url(),
            all_debrid_url: default_all_debrid_url(),
            torbox_url: default_torbox_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Remote library sync configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upload the library on startup (default: true).
    #[serde(default = "default_sync_enabled")]
    pub enabled: bool,
    /// Base URL of the library API.
    #[serde(default = "default_sync_api_url")]
    pub api_url: String,
    /// Number of games per upload request.
    #[serde(default = "default_sync_batch_size")]
    pub batch_size: usize,
    /// HTTP timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sync_enabled() -> bool {
    true
}

fn default_sync_api_url() -> String {
    "https://api.hydralauncher.gg/".to_string()
}

fn default_sync_batch_size() -> usize {
    50
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_sync_enabled(),
            api_url: default_sync_api_url(),
            batch_size: default_sync_batch_size(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate sync configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("sync.batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Background download agent (aria2) configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Spawn the agent on startup (default: true).
    #[serde(default = "default_agent_enabled")]
    pub enabled: bool,
    /// Path or name of the aria2c binary.
    #[serde(default = "default_agent_binary")]
    pub binary: PathBuf,
    /// JSON-RPC port the agent listens on.
    #[serde(default = "default_agent_rpc_port")]
    pub rpc_port: u16,
    /// Shared RPC secret, passed as `token:<secret>` on every call.
    pub rpc_secret: Option<String>,
}

fn default_agent_enabled() -> bool {
    true
}

fn default_agent_binary() -> PathBuf {
    PathBuf::from("aria2c")
}

fn default_agent_rpc_port() -> u16 {
    6800
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: default_agent_enabled(),
            binary: default_agent_binary(),
            rpc_port: default_agent_rpc_port(),
            rpc_secret: None,
        }
    }
}

impl AgentConfig {
    /// JSON-RPC endpoint of the local agent.
    pub fn rpc_url(&self) -> String {
        format!("http://127.0.0.1:{}/jsonrpc", self.rpc_port)
    }
}

/// Save-game backup tool (Ludusavi) configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Ludusavi `config.yaml`. Registration is skipped when unset.
    pub ludusavi_config_path: Option<PathBuf>,
    /// Secondary manifest registered in the Ludusavi config.
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
}

fn default_manifest_url() -> String {
    "https://cdn.losbroxas.org/manifest.yaml".to_string()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            ludusavi_config_path: None,
            manifest_url: default_manifest_url(),
        }
    }
}

/// Main loop configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MainLoopConfig {
    /// Interval between heartbeat ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    500
}

impl Default for MainLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl MainLoopConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate main loop configuration.
    pub fn validate(&self) -> Result<(), String> {
        // tokio::time::interval panics on a zero period
        if self.tick_interval_ms == 0 {
            return Err("main_loop.tick_interval_ms cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub legacy: LegacyConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cipher: CipherKeyConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub main_loop: MainLoopConfig,
}

impl AppConfig {
    /// Create a test configuration.
    ///
    /// **For testing only.** Uses the memory store, a generated key and
    /// disables every external process and network call.
    pub fn for_testing() -> Self {
        Self {
            store: StoreConfig::Memory,
            cipher: CipherKeyConfig::Generate,
            sync: SyncConfig {
                enabled: false,
                ..SyncConfig::default()
            },
            agent: AgentConfig {
                enabled: false,
                ..AgentConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.sync.validate()?;
        self.main_loop.validate()?;
        Ok(())
    }
}

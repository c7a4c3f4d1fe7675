//! Launcher error types.

use thiserror::Error;

/// Errors raised by the migration orchestrator, the startup sequencer and
/// their collaborators.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("storage error: {0}")]
    Storage(#[from] hearth_storage::StorageError),

    #[error("legacy database error: {0}")]
    Legacy(#[from] hearth_legacy::LegacyError),

    #[error("crypto error: {0}")]
    Crypto(#[from] hearth_crypto::CryptoError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid legacy record in {table}: {message}")]
    InvalidRecord { table: &'static str, message: String },

    #[error("provider {provider} rejected authorization: {message}")]
    Authorization { provider: String, message: String },

    #[error("download agent error: {0}")]
    Agent(String),

    #[error("download engine error: {0}")]
    Engine(String),

    #[error("remote sync error: {0}")]
    Sync(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for launcher operations.
pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

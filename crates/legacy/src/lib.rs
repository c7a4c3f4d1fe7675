//! Read-only access to the legacy SQLite database.
//!
//! The legacy desktop app persisted its state in four tables:
//! - `game`: library entries
//! - `user_preferences`: settings and provider credentials
//! - `game_achievement`: achievement definitions and unlocks
//! - `user_auth`: the signed-in session

pub mod error;
pub mod models;
pub mod repos;
pub mod schema;
pub mod store;

pub use error::{LegacyError, LegacyResult};
pub use store::{LegacyStore, SqliteLegacyStore};

use hearth_core::config::LegacyConfig;
use std::sync::Arc;

/// Open the legacy database from configuration.
///
/// Returns `None` when there is no legacy database to migrate from.
pub async fn from_config(config: &LegacyConfig) -> LegacyResult<Option<Arc<dyn LegacyStore>>> {
    if !legacy_db_exists(&config.path)? {
        tracing::info!(path = %config.path.display(), "No legacy database found");
        return Ok(None);
    }
    let store = SqliteLegacyStore::open(&config.path, config.busy_timeout()).await?;
    Ok(Some(Arc::new(store) as Arc<dyn LegacyStore>))
}

fn legacy_db_exists(path: &std::path::Path) -> LegacyResult<bool> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(true),
        Ok(_) => Err(crate::LegacyError::Config(format!(
            "legacy database path is not a file: {}",
            path.display()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

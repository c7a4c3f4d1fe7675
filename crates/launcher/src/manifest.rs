//! Registration of the game-save manifest with Ludusavi.

use crate::error::LaunchResult;
use crate::services::ManifestRegistrar;
use async_trait::async_trait;
use hearth_core::config::BackupConfig;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Edits the Ludusavi `config.yaml` so backups use our manifest.
///
/// The primary manifest is disabled and ours is added as an enabled
/// secondary one. Other secondary manifests are kept.
pub struct LudusaviRegistrar {
    config_path: Option<PathBuf>,
    manifest_url: String,
}

impl LudusaviRegistrar {
    pub fn new(config: &BackupConfig) -> Self {
        Self {
            config_path: config.ludusavi_config_path.clone(),
            manifest_url: config.manifest_url.clone(),
        }
    }

    async fn read_config(path: &Path) -> LaunchResult<Value> {
        match fs::read_to_string(path).await {
            Ok(text) if text.trim().is_empty() => Ok(Value::Mapping(Mapping::new())),
            Ok(text) => Ok(serde_yaml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Value::Mapping(Mapping::new()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_config(path: &Path, config: &Value) -> LaunchResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let text = serde_yaml::to_string(config)?;
        let temp_path = path.with_extension(format!("yaml.tmp.{}", uuid::Uuid::new_v4()));
        fs::write(&temp_path, text).await?;
        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Apply the manifest settings to a parsed config. Returns whether anything
/// changed.
pub(crate) fn register_manifest(config: &mut Value, manifest_url: &str) -> bool {
    if !config.is_mapping() {
        *config = Value::Mapping(Mapping::new());
    }
    let Some(root) = config.as_mapping_mut() else {
        return false;
    };

    let manifest = root
        .entry(Value::from("manifest"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !manifest.is_mapping() {
        *manifest = Value::Mapping(Mapping::new());
    }
    let Some(manifest) = manifest.as_mapping_mut() else {
        return false;
    };

    let mut changed = false;
    if manifest.get("enable") != Some(&Value::Bool(false)) {
        manifest.insert(Value::from("enable"), Value::Bool(false));
        changed = true;
    }

    let secondary = manifest
        .entry(Value::from("secondary"))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if !secondary.is_sequence() {
        *secondary = Value::Sequence(Vec::new());
    }
    let Some(entries) = secondary.as_sequence_mut() else {
        return changed;
    };

    let existing = entries
        .iter_mut()
        .find(|entry| entry.get("url").and_then(Value::as_str) == Some(manifest_url));
    match existing {
        Some(entry) => {
            if entry.get("enable") != Some(&Value::Bool(true))
                && let Some(entry) = entry.as_mapping_mut()
            {
                entry.insert(Value::from("enable"), Value::Bool(true));
                changed = true;
            }
        }
        None => {
            let mut entry = Mapping::new();
            entry.insert(Value::from("url"), Value::from(manifest_url));
            entry.insert(Value::from("enable"), Value::Bool(true));
            entries.push(Value::Mapping(entry));
            changed = true;
        }
    }
    changed
}

#[async_trait]
impl ManifestRegistrar for LudusaviRegistrar {
    async fn add_manifest_to_config(&self) -> LaunchResult<()> {
        let Some(path) = &self.config_path else {
            tracing::debug!("No Ludusavi config configured, skipping manifest registration");
            return Ok(());
        };

        let mut config = Self::read_config(path).await?;
        if register_manifest(&mut config, &self.manifest_url) {
            Self::write_config(path, &config).await?;
            tracing::info!(path = %path.display(), "Registered backup manifest");
        } else {
            tracing::debug!(path = %path.display(), "Backup manifest already registered");
        }
        Ok(())
    }
}

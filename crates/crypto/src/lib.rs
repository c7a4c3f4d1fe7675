//! Encryption of secrets at rest for Hearth.
//!
//! This crate provides:
//! - Key generation, parsing and loading from configuration
//! - The [`SecretCipher`] trait and a ChaCha20-Poly1305 implementation

pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::{ChaChaCipher, SecretCipher};
pub use error::{CryptoError, CryptoResult};
pub use key::SecretKey;

use hearth_core::config::CipherKeyConfig;
use std::path::Path;

/// Build the secret cipher from configuration.
///
/// A missing key file is created with a fresh key, so the first run of a new
/// installation works without setup.
pub fn from_config(config: &CipherKeyConfig) -> CryptoResult<ChaChaCipher> {
    let key = match config {
        CipherKeyConfig::File { path } => load_or_create_key_file(path)?,
        CipherKeyConfig::Env { var } => {
            let value = std::env::var(var).map_err(|_| {
                CryptoError::KeyParsing(format!("cipher key env var not set: {var}"))
            })?;
            SecretKey::from_base64(&value)?
        }
        CipherKeyConfig::Value { key } => {
            tracing::warn!("Using inline cipher key (not recommended for production)");
            SecretKey::from_base64(key)?
        }
        CipherKeyConfig::Generate => {
            tracing::warn!(
                "Generating ephemeral cipher key, secrets written now are unreadable after restart"
            );
            SecretKey::generate()
        }
    };
    Ok(ChaChaCipher::new(&key))
}

fn load_or_create_key_file(path: &Path) -> CryptoResult<SecretKey> {
    match std::fs::read_to_string(path) {
        Ok(data) => {
            let key = SecretKey::from_base64(&data)?;
            tracing::debug!(path = %path.display(), "Loaded cipher key");
            Ok(key)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let key = SecretKey::generate();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            write_key_file(path, &key.to_base64())?;
            tracing::info!(path = %path.display(), "Created new cipher key");
            Ok(key)
        }
        Err(e) => Err(CryptoError::Io(e)),
    }
}

#[cfg(unix)]
fn write_key_file(path: &Path, contents: &str) -> CryptoResult<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_key_file(path: &Path, contents: &str) -> CryptoResult<()> {
    std::fs::write(path, contents)?;
    Ok(())
}

//! Symmetric key material.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key};
use std::fmt;

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// A 256-bit key used to encrypt secrets at rest.
#[derive(Clone)]
pub struct SecretKey {
    inner: Key,
}

impl SecretKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self {
            inner: ChaCha20Poly1305::generate_key(&mut OsRng),
        }
    }

    /// Parse a base64 encoded key.
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| CryptoError::KeyParsing(format!("invalid base64: {e}")))?;

        if bytes.len() != KEY_LEN {
            return Err(CryptoError::KeyParsing(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self {
            inner: *Key::from_slice(&bytes),
        })
    }

    /// Encode as base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.inner.as_slice())
    }

    pub(crate) fn key(&self) -> &Key {
        &self.inner
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

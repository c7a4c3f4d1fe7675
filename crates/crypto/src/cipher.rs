//! Secret encryption at rest.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SecretKey;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

/// Prefix of every ciphertext envelope.
pub const ENVELOPE_PREFIX: &str = "v1:";

const NONCE_LEN: usize = 12;
/// Poly1305 tag appended to every ciphertext.
const TAG_LEN: usize = 16;

/// Encrypts short secrets (API tokens, keys) into printable strings.
pub trait SecretCipher: Send + Sync {
    /// Encrypt a secret. Encrypting the same plaintext twice yields different
    /// ciphertexts.
    fn encrypt(&self, plaintext: &str) -> CryptoResult<String>;

    /// Decrypt a value produced by [`SecretCipher::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> CryptoResult<String>;
}

/// ChaCha20-Poly1305 cipher producing `v1:<base64(nonce || ciphertext)>`.
pub struct ChaChaCipher {
    aead: ChaCha20Poly1305,
}

impl ChaChaCipher {
    pub fn new(key: &SecretKey) -> Self {
        Self {
            aead: ChaCha20Poly1305::new(key.key()),
        }
    }
}

impl SecretCipher for ChaChaCipher {
    fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&ciphertext);
        Ok(format!("{ENVELOPE_PREFIX}{}", STANDARD.encode(payload)))
    }

    fn decrypt(&self, ciphertext: &str) -> CryptoResult<String> {
        let encoded = ciphertext.strip_prefix(ENVELOPE_PREFIX).ok_or_else(|| {
            CryptoError::InvalidEnvelope(format!("missing {ENVELOPE_PREFIX} prefix"))
        })?;
        let payload = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidEnvelope(format!("invalid base64: {e}")))?;
        if payload.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::InvalidEnvelope(format!(
                "payload too short: {} bytes",
                payload.len()
            )));
        }

        let (nonce, sealed) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .aead
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::InvalidEnvelope("plaintext is not UTF-8".to_string()))
    }
}

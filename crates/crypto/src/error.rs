//! Crypto error types.

use thiserror::Error;

/// Secret encryption errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key parsing error: {0}")]
    KeyParsing(String),

    #[error("encryption error: {0}")]
    Encrypt(String),

    #[error("decryption failed: wrong key or tampered ciphertext")]
    Decrypt,

    #[error("invalid ciphertext envelope: {0}")]
    InvalidEnvelope(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

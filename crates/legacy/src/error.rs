//! Legacy database error types.

use thiserror::Error;

/// Legacy database operation errors.
#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for legacy database operations.
pub type LegacyResult<T> = std::result::Result<T, LegacyError>;

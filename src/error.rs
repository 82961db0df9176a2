//! Error types for Drive.

use thiserror::Error;

/// Common error type for Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Malformed or missing input (empty name, self-parenting, bad path).
    #[error("validation error: {0}")]
    Validation(String),

    /// Sibling name collision or a non-empty folder deleted without force.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Durable store failure.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error (blob store, log files, config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DriveError {
    fn from(e: sqlx::Error) -> Self {
        DriveError::Storage(e.to_string())
    }
}

/// Result type alias for Drive operations.
pub type Result<T> = std::result::Result<T, DriveError>;

//! Common error types for Lodge

use thiserror::Error;

/// Common result type for Lodge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the Lodge backend
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation failed (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON column or payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested row or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied value failed validation (bad enum string, bad UUID)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored data violated an expectation (corrupt row, unparsable timestamp)
    #[error("Internal error: {0}")]
    Internal(String),
}

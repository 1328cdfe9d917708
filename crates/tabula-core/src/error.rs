//! Error types for Tabula core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors, while higher-level code can use `anyhow` for
//! convenient error handling.
//!
//! Note that the tokenizer and the query matcher never fail: malformed
//! queries degrade to "matches nothing" or "matches everything".

use thiserror::Error;

/// Result type alias using TabulaError
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Core error types for Tabula operations.
#[derive(Error, Debug)]
pub enum TabulaError {
    // === Table Errors ===
    /// A custom-class lookup was attempted without a configured class map
    #[error("Custom classes are not set!")]
    CustomClassesNotSet,

    /// A dataset could not be interpreted as rows and columns
    #[error("invalid dataset: {reason}")]
    DatasetInvalid { reason: String },

    // === Persistence Errors ===
    /// A stored table configuration could not be decoded
    #[error("stored configuration for table {key} is corrupted: {reason}")]
    SnapshotCorrupted { key: String, reason: String },

    /// The key-value store failed
    #[error("storage error: {operation} failed: {reason}")]
    Storage { operation: String, reason: String },

    // === Configuration Errors ===
    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TabulaError {
    /// Returns true if this error is recoverable (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TabulaError::Io(_) | TabulaError::Storage { .. })
    }

    /// Create a storage error
    pub fn storage(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        TabulaError::Storage {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset(reason: impl Into<String>) -> Self {
        TabulaError::DatasetInvalid {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        TabulaError::Serialization(err.to_string())
    }
}

//! Storage error types

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failure reported by the backing store, message kept verbatim
    #[error("{0}")]
    Backend(String),

    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Document is not a JSON object or does not have the expected shape
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Invalid collection name
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Get error code for CLI and log output
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "NOT_FOUND",
            StorageError::InvalidDocument(_) => "INVALID_DOCUMENT",
            StorageError::InvalidCollection(_) => "INVALID_COLLECTION",
            StorageError::Io(_) => "IO_ERROR",
            StorageError::Json(_) => "SERIALIZATION_ERROR",
            StorageError::Backend(_) => "STORAGE_ERROR",
        }
    }
}

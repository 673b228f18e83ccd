//! Storage error types

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend failure reported by the underlying store
    #[error("backend error: {0}")]
    Backend(String),

    /// Key not found
    #[error("key not found")]
    NotFound,

    /// Invalid data format
    #[error("invalid data format: {0}")]
    InvalidFormat(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

//! Error types for TagKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::value::ValueType;

/// Result type alias using TagKvError
pub type Result<T> = std::result::Result<T, TagKvError>;

/// Unified error type for TagKV operations
#[derive(Debug, Error)]
pub enum TagKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database not open")]
    NotOpen,

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {key}")]
    NotFound { key: String },

    #[error("Key already exists: {key}")]
    DuplicateKey { key: String },

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Unsupported value type: {0}")]
    UnsupportedType(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for TagKvError {
    fn from(e: serde_json::Error) -> Self {
        TagKvError::Decode(e.to_string())
    }
}

// Every redb failure surfaces as a storage error
macro_rules! storage_error_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for TagKvError {
                fn from(e: $source) -> Self {
                    TagKvError::Storage(e.to_string())
                }
            }
        )+
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

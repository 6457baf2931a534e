//! Error types for storage operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid record key: {0}")]
    InvalidKey(String),

    #[error("Corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

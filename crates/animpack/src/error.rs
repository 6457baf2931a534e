//! Error types for package operations

use thiserror::Error;

/// Errors that can occur while reading or writing template packages
#[derive(Debug, Error)]
pub enum PackageError {
    /// IO error while writing archive data
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The archive could not be read
    #[error("Failed to read package, the file may be corrupted: {0}")]
    Corrupted(String),

    /// The archive inflates beyond the configured ceiling
    #[error("Package exceeds maximum size of {max} bytes")]
    TooLarge { max: u64 },

    /// An asset could not be decoded
    #[error("Invalid asset '{path}': {reason}")]
    InvalidAsset { path: String, reason: String },

    /// Bulk export was called without any templates
    #[error("No templates selected for export")]
    EmptyExport,
}

impl PackageError {
    /// Create a new Corrupted error
    pub fn corrupted(reason: impl Into<String>) -> Self {
        Self::Corrupted(reason.into())
    }

    /// Create a new InvalidAsset error
    pub fn invalid_asset(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAsset {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for package operations
pub type PackageResult<T> = std::result::Result<T, PackageError>;

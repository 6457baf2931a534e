//! Error types for the import pipeline

use thiserror::Error;

/// Pipeline-fatal import failures
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file does not carry an archive extension
    #[error("Unsupported file type '{0}': expected a .animpack or .zip archive")]
    UnsupportedFile(String),

    /// The archive could not be opened or read
    #[error("Failed to read package, the file may be corrupted: {0}")]
    Corrupted(String),

    /// The validator reported blocking errors
    #[error("Package validation failed: {0}")]
    ValidationFailed(String),

    /// Strict mode and at least one dependency failed
    #[error("Failed to load dependencies: {0}")]
    DependencyFailed(String),

    /// A bulk archive held no packages
    #[error("Bulk archive contains no template packages")]
    EmptyBulk,

    /// Persisting the record failed
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),
}

impl From<animpack::PackageError> for ImportError {
    fn from(err: animpack::PackageError) -> Self {
        match err {
            animpack::PackageError::Corrupted(reason) => Self::Corrupted(reason),
            other => Self::Corrupted(other.to_string()),
        }
    }
}

/// Result type for import operations
pub type ImportResult<T> = std::result::Result<T, ImportError>;

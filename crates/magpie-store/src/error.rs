//! Error types for blob storage operations.

use thiserror::Error;

/// Errors from blob storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// A storage URL could not be parsed into `scheme://container/key`.
    #[error("invalid storage url: {url}")]
    InvalidUrl { url: String },

    /// A backend was requested for a scheme no backend is registered under.
    #[error("storage backend not supported: {scheme}")]
    BackendNotSupported { scheme: String },

    /// A conditional write observed a version other than the expected one.
    /// Nothing was written.
    #[error("version conflict on {path}")]
    VersionConflict { path: String },

    /// The stored object is not valid UTF-8 and was read as text.
    #[error("object at {path} is not valid utf-8")]
    NotText { path: String },

    /// I/O error from the underlying backend.
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

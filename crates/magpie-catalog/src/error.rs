//! Error types for catalog operations.

use magpie_store::StoreError;
use thiserror::Error;

/// Errors from catalog load/save/update operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The persisted catalog changed between load and save. Transient:
    /// recovered by reload-and-reapply, fatal only once retries are
    /// exhausted.
    #[error("version conflict saving catalog '{name}'")]
    Conflict { name: String },

    /// The catalog document could not be serialized or parsed.
    #[error("catalog document error: {0}")]
    Document(#[from] serde_json::Error),

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        CatalogError::Storage(err)
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

//! Loading, saving, and conflict-retried updating of catalogs.

use std::sync::Arc;

use magpie_store::{BlobPath, BlobStore, StoreError};
use magpie_types::Stash;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};

/// Name of the catalog document within its container.
const METADATA_FILENAME: &str = "_metadata.json";

/// Default number of attempts for [`CatalogRepo::update`].
pub const DEFAULT_UPDATE_TRIES: u32 = 5;

/// Repository for loading and saving [`Stash`] catalogs.
#[derive(Clone)]
pub struct CatalogRepo {
    store: Arc<dyn BlobStore>,
}

impl CatalogRepo {
    /// Create a repository over the given storage backend.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    fn metadata_path(name: &str) -> BlobPath {
        BlobPath::new(name, METADATA_FILENAME)
    }

    /// Load the catalog with the given name.
    ///
    /// A missing document is a valid initial state: a fresh empty catalog
    /// carrying no version token is returned, not an error.
    pub fn load(&self, name: &str) -> CatalogResult<Stash> {
        match self.store.read_versioned(&Self::metadata_path(name)) {
            Ok((text, version)) => {
                let mut stash: Stash = serde_json::from_str(&text)?;
                stash.version = Some(version);
                Ok(stash)
            }
            Err(StoreError::NotFound { .. }) => {
                debug!(catalog = name, "no metadata document, starting empty");
                Ok(Stash::new(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save the catalog as a whole-document overwrite.
    ///
    /// The write is conditional on the version observed at load; if the
    /// persisted document has drifted, the save fails with
    /// [`CatalogError::Conflict`] and nothing is written. On success the
    /// in-memory token advances to the newly written version.
    pub fn save(&self, stash: &mut Stash) -> CatalogResult<()> {
        let text = serde_json::to_string(&stash)?;
        let path = Self::metadata_path(&stash.name);
        match self
            .store
            .store_if_version(&path, &text, stash.version.as_ref())
        {
            Ok(version) => {
                stash.version = Some(version);
                Ok(())
            }
            Err(StoreError::VersionConflict { .. }) => Err(CatalogError::Conflict {
                name: stash.name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a mutation to the named catalog with bounded conflict retry
    /// ([`DEFAULT_UPDATE_TRIES`] attempts).
    pub fn update<T, F>(&self, name: &str, mutate: F) -> CatalogResult<T>
    where
        F: FnMut(&mut Stash) -> T,
    {
        self.update_with_tries(name, DEFAULT_UPDATE_TRIES, mutate)
    }

    /// Apply a mutation to the named catalog, retrying on version conflict.
    ///
    /// Each attempt reloads the catalog from storage and re-applies the
    /// mutation from scratch, so the mutation must be safe to run more than
    /// once. Exhausting `tries` surfaces the conflict to the caller.
    pub fn update_with_tries<T, F>(&self, name: &str, tries: u32, mut mutate: F) -> CatalogResult<T>
    where
        F: FnMut(&mut Stash) -> T,
    {
        let mut remaining = tries;
        loop {
            let mut stash = self.load(name)?;
            let out = mutate(&mut stash);
            match self.save(&mut stash) {
                Ok(()) => return Ok(out),
                Err(CatalogError::Conflict { .. }) if remaining > 1 => {
                    remaining -= 1;
                    debug!(catalog = name, remaining, "catalog save conflicted, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for CatalogRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogRepo").finish_non_exhaustive()
    }
}

//! The [`BlobStore`] trait defining the storage backend interface.

use std::io::Read;

use magpie_types::Version;

use crate::error::StoreResult;
use crate::path::BlobPath;

/// Storage backend interface.
///
/// All operations are synchronous and blocking; backends provide no retry
/// logic of their own. Implementations must be thread-safe (`Send + Sync`):
/// independent processes and threads read and write the same containers
/// concurrently, coordinated only by the version tokens.
pub trait BlobStore: Send + Sync {
    /// Store text at the given path, overwriting unconditionally.
    fn store(&self, path: &BlobPath, text: &str) -> StoreResult<()>;

    /// Store the contents of a byte stream at the given path. Returns the
    /// number of bytes written.
    fn store_stream(&self, path: &BlobPath, stream: &mut dyn Read) -> StoreResult<u64>;

    /// Read the object at the given path as text.
    ///
    /// Fails with [`StoreError::NotFound`] if absent.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    fn read(&self, path: &BlobPath) -> StoreResult<String>;

    /// Read the object at the given path along with its current version
    /// token.
    fn read_versioned(&self, path: &BlobPath) -> StoreResult<(String, Version)>;

    /// Conditionally store text at the given path.
    ///
    /// `expected` is the version observed when the object was last read;
    /// `None` means the object is expected not to exist yet. If the
    /// persisted version differs, the write fails with
    /// [`StoreError::VersionConflict`] and nothing is written. On success
    /// the new version token is returned.
    ///
    /// [`StoreError::VersionConflict`]: crate::StoreError::VersionConflict
    fn store_if_version(
        &self,
        path: &BlobPath,
        text: &str,
        expected: Option<&Version>,
    ) -> StoreResult<Version>;

    /// Open a readable byte stream over the object at the given path.
    ///
    /// Fails with [`StoreError::NotFound`] if absent. The underlying handle
    /// is released when the returned reader is dropped, on every exit path.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    fn open_stream(&self, path: &BlobPath) -> StoreResult<Box<dyn Read + Send>>;
}

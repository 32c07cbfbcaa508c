//! Filesystem blob store.
//!
//! Objects live under `<root>/<container>/<key>`; a container is a
//! directory, created on first write. This backend stands in for a vendor
//! object store: the version token is a content digest (the backend's ETag
//! equivalent), and writes land through a temp file plus rename so a reader
//! never observes a half-written object.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use magpie_types::Version;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::path::BlobPath;
use crate::traits::BlobStore;

/// Directory-backed blob store.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at the given directory. The directory is
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory this store writes under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, path: &BlobPath) -> StoreResult<PathBuf> {
        // Containers and keys must stay inside the root.
        for part in std::iter::once(path.container.as_str()).chain(path.key.split('/')) {
            if part.is_empty() || part == "." || part == ".." {
                return Err(StoreError::InvalidUrl {
                    url: path.to_string(),
                });
            }
        }
        Ok(self.root.join(&path.container).join(&path.key))
    }

    fn read_bytes(&self, path: &BlobPath) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.object_path(path)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomic(&self, path: &BlobPath, mut stream: &mut dyn Read) -> StoreResult<u64> {
        let target = self.object_path(path)?;
        let dir = target.parent().expect("object path always has a parent");
        fs::create_dir_all(dir)?;

        // Stage in the target directory so the final rename stays on one
        // filesystem.
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        let written = io::copy(&mut stream, staged.as_file_mut())?;
        staged.as_file_mut().flush()?;
        staged
            .persist(&target)
            .map_err(|e| StoreError::Io(e.error))?;
        debug!(object = %path, bytes = written, "stored blob");
        Ok(written)
    }

    fn digest(bytes: &[u8]) -> Version {
        Version::new(blake3::hash(bytes).to_hex().to_string())
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, path: &BlobPath, text: &str) -> StoreResult<()> {
        self.write_atomic(path, &mut text.as_bytes())?;
        Ok(())
    }

    fn store_stream(&self, path: &BlobPath, stream: &mut dyn Read) -> StoreResult<u64> {
        self.write_atomic(path, stream)
    }

    fn read(&self, path: &BlobPath) -> StoreResult<String> {
        let bytes = self.read_bytes(path)?.ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|_| StoreError::NotText {
            path: path.to_string(),
        })
    }

    fn read_versioned(&self, path: &BlobPath) -> StoreResult<(String, Version)> {
        let bytes = self.read_bytes(path)?.ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        let version = Self::digest(&bytes);
        let text = String::from_utf8(bytes).map_err(|_| StoreError::NotText {
            path: path.to_string(),
        })?;
        Ok((text, version))
    }

    fn store_if_version(
        &self,
        path: &BlobPath,
        text: &str,
        expected: Option<&Version>,
    ) -> StoreResult<Version> {
        let current = self.read_bytes(path)?.map(|bytes| Self::digest(&bytes));
        if current.as_ref() != expected {
            return Err(StoreError::VersionConflict {
                path: path.to_string(),
            });
        }
        self.write_atomic(path, &mut text.as_bytes())?;
        Ok(Self::digest(text.as_bytes()))
    }

    fn open_stream(&self, path: &BlobPath) -> StoreResult<Box<dyn Read + Send>> {
        match File::open(self.object_path(path)?) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        (dir, store)
    }

    fn path(key: &str) -> BlobPath {
        BlobPath::new("bucket", key)
    }

    #[test]
    fn store_and_read() {
        let (_dir, store) = store();
        store.store(&path("a.txt"), "hello").unwrap();
        assert_eq!(store.read(&path("a.txt")).unwrap(), "hello");
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.read(&path("nope")),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn nested_keys_create_directories() {
        let (_dir, store) = store();
        store.store(&path("2024/01/a.dump"), "payload").unwrap();
        assert_eq!(store.read(&path("2024/01/a.dump")).unwrap(), "payload");
    }

    #[test]
    fn traversal_components_are_rejected() {
        let (_dir, store) = store();
        let bad = BlobPath::new("bucket", "../escape");
        assert!(matches!(
            store.store(&bad, "x"),
            Err(StoreError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn store_stream_and_open_stream_roundtrip() {
        let (_dir, store) = store();
        let mut input = Cursor::new(b"dump bytes".to_vec());
        let written = store.store_stream(&path("s.dump"), &mut input).unwrap();
        assert_eq!(written, 10);

        let mut stream = store.open_stream(&path("s.dump")).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"dump bytes");
    }

    #[test]
    fn open_stream_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.open_stream(&path("nope")),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn version_tracks_content() {
        let (_dir, store) = store();
        store.store(&path("v.json"), "one").unwrap();
        let (_, v1) = store.read_versioned(&path("v.json")).unwrap();
        store.store(&path("v.json"), "two").unwrap();
        let (_, v2) = store.read_versioned(&path("v.json")).unwrap();
        assert_ne!(v1, v2);

        // Writing identical content yields the same token.
        store.store(&path("v.json"), "one").unwrap();
        let (_, v3) = store.read_versioned(&path("v.json")).unwrap();
        assert_eq!(v1, v3);
    }

    #[test]
    fn conditional_write_detects_drift() {
        let (_dir, store) = store();
        let v1 = store.store_if_version(&path("v.json"), "one", None).unwrap();
        store
            .store_if_version(&path("v.json"), "two", Some(&v1))
            .unwrap();

        let err = store.store_if_version(&path("v.json"), "three", Some(&v1));
        assert!(matches!(err, Err(StoreError::VersionConflict { .. })));
        assert_eq!(store.read(&path("v.json")).unwrap(), "two");
    }

    #[test]
    fn conditional_create_fails_if_present() {
        let (_dir, store) = store();
        store.store(&path("v.json"), "existing").unwrap();
        assert!(matches!(
            store.store_if_version(&path("v.json"), "new", None),
            Err(StoreError::VersionConflict { .. })
        ));
    }
}

//! Backend registry: resolves URL schemes to [`BlobStore`] backends.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::fs::FsBlobStore;
use crate::path::{make_url, parse_url, BlobPath};
use crate::traits::BlobStore;

/// The scheme registered by the default configuration.
pub const DEFAULT_SCHEME: &str = "fs";

/// Maps URL schemes to storage backends.
///
/// The default configuration registers exactly one scheme
/// ([`DEFAULT_SCHEME`], backed by [`FsBlobStore`]); requesting any other
/// scheme fails with [`StoreError::BackendNotSupported`].
pub struct Backends {
    backends: HashMap<String, Arc<dyn BlobStore>>,
}

impl Backends {
    /// An empty registry with no schemes.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// The default registry: one `fs` backend rooted at the given directory.
    pub fn with_default_backend(root: impl Into<std::path::PathBuf>) -> Self {
        let mut backends = Self::new();
        backends.register(DEFAULT_SCHEME, Arc::new(FsBlobStore::new(root)));
        backends
    }

    /// Register a backend under a scheme, replacing any previous mapping.
    pub fn register(&mut self, scheme: impl Into<String>, backend: Arc<dyn BlobStore>) {
        self.backends.insert(scheme.into(), backend);
    }

    /// Returns `true` if a backend is registered under the scheme.
    pub fn supports(&self, scheme: &str) -> bool {
        self.backends.contains_key(scheme)
    }

    /// Resolve a scheme to its backend.
    pub fn get(&self, scheme: &str) -> StoreResult<Arc<dyn BlobStore>> {
        self.backends
            .get(scheme)
            .cloned()
            .ok_or_else(|| StoreError::BackendNotSupported {
                scheme: scheme.to_string(),
            })
    }

    /// Render a storage URL, rejecting unregistered schemes.
    pub fn make_url(&self, scheme: &str, path: &BlobPath) -> StoreResult<String> {
        if !self.supports(scheme) {
            return Err(StoreError::BackendNotSupported {
                scheme: scheme.to_string(),
            });
        }
        Ok(make_url(scheme, path))
    }

    /// Store text under the scheme's backend. Returns the storage URL.
    pub fn store(&self, scheme: &str, path: &BlobPath, text: &str) -> StoreResult<String> {
        self.get(scheme)?.store(path, text)?;
        Ok(make_url(scheme, path))
    }

    /// Store a byte stream under the scheme's backend. Returns the storage
    /// URL.
    pub fn store_stream(
        &self,
        scheme: &str,
        path: &BlobPath,
        stream: &mut dyn Read,
    ) -> StoreResult<String> {
        self.get(scheme)?.store_stream(path, stream)?;
        Ok(make_url(scheme, path))
    }

    /// Read the object a storage URL points at, as text.
    pub fn read_url(&self, url: &str) -> StoreResult<String> {
        let (scheme, path) = parse_url(url)?;
        self.get(&scheme)?.read(&path)
    }

    /// Open a readable byte stream over the object a storage URL points at.
    pub fn open_url(&self, url: &str) -> StoreResult<Box<dyn Read + Send>> {
        let (scheme, path) = parse_url(url)?;
        self.get(&scheme)?.open_stream(&path)
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("Backends").field("schemes", &schemes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlobStore;

    fn memory_registry() -> Backends {
        let mut backends = Backends::new();
        backends.register("mem", Arc::new(MemoryBlobStore::new()));
        backends
    }

    #[test]
    fn unknown_scheme_is_not_supported() {
        let backends = memory_registry();
        assert!(matches!(
            backends.get("s3"),
            Err(StoreError::BackendNotSupported { .. })
        ));
        assert!(matches!(
            backends.make_url("s3", &BlobPath::new("b", "k")),
            Err(StoreError::BackendNotSupported { .. })
        ));
    }

    #[test]
    fn store_returns_url_and_read_url_resolves_it() {
        let backends = memory_registry();
        let url = backends
            .store("mem", &BlobPath::new("bucket", "a.txt"), "hello")
            .unwrap();
        assert_eq!(url, "mem://bucket/a.txt");
        assert_eq!(backends.read_url(&url).unwrap(), "hello");
    }

    #[test]
    fn store_stream_returns_url_and_open_url_streams_it() {
        let backends = memory_registry();
        let mut input = std::io::Cursor::new(b"dump".to_vec());
        let url = backends
            .store_stream("mem", &BlobPath::new("bucket", "a.dump"), &mut input)
            .unwrap();

        let mut stream = backends.open_url(&url).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"dump");
    }

    #[test]
    fn read_url_rejects_malformed_urls() {
        let backends = memory_registry();
        assert!(matches!(
            backends.read_url("not-a-url"),
            Err(StoreError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn default_backend_is_fs_only() {
        let dir = tempfile::tempdir().unwrap();
        let backends = Backends::with_default_backend(dir.path());
        assert!(backends.supports(DEFAULT_SCHEME));
        assert!(!backends.supports("s3"));
    }
}

//! In-memory blob store for tests and embedding.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::RwLock;

use magpie_types::Version;

use crate::error::{StoreError, StoreResult};
use crate::path::BlobPath;
use crate::traits::BlobStore;

/// One stored object plus its generation counter.
#[derive(Clone)]
struct Entry {
    data: Vec<u8>,
    generation: u64,
}

/// In-memory, HashMap-based blob store.
///
/// All objects live behind a single `RwLock`, which makes conditional
/// writes genuinely atomic: the version comparison and the write happen
/// under one write lock. The version token is a per-object generation
/// counter.
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<BlobPath, Entry>>,
}

impl MemoryBlobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    fn version_of(entry: &Entry) -> Version {
        Version::new(format!("g{}", entry.generation))
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, path: &BlobPath, text: &str) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        let generation = map.get(path).map(|e| e.generation + 1).unwrap_or(1);
        map.insert(
            path.clone(),
            Entry {
                data: text.as_bytes().to_vec(),
                generation,
            },
        );
        Ok(())
    }

    fn store_stream(&self, path: &BlobPath, stream: &mut dyn Read) -> StoreResult<u64> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        let written = data.len() as u64;
        let mut map = self.objects.write().expect("lock poisoned");
        let generation = map.get(path).map(|e| e.generation + 1).unwrap_or(1);
        map.insert(path.clone(), Entry { data, generation });
        Ok(written)
    }

    fn read(&self, path: &BlobPath) -> StoreResult<String> {
        let map = self.objects.read().expect("lock poisoned");
        let entry = map.get(path).ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        String::from_utf8(entry.data.clone()).map_err(|_| StoreError::NotText {
            path: path.to_string(),
        })
    }

    fn read_versioned(&self, path: &BlobPath) -> StoreResult<(String, Version)> {
        let map = self.objects.read().expect("lock poisoned");
        let entry = map.get(path).ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        let text = String::from_utf8(entry.data.clone()).map_err(|_| StoreError::NotText {
            path: path.to_string(),
        })?;
        Ok((text, Self::version_of(entry)))
    }

    fn store_if_version(
        &self,
        path: &BlobPath,
        text: &str,
        expected: Option<&Version>,
    ) -> StoreResult<Version> {
        let mut map = self.objects.write().expect("lock poisoned");
        let current = map.get(path).map(Self::version_of);
        if current.as_ref() != expected {
            return Err(StoreError::VersionConflict {
                path: path.to_string(),
            });
        }
        let generation = map.get(path).map(|e| e.generation + 1).unwrap_or(1);
        let entry = Entry {
            data: text.as_bytes().to_vec(),
            generation,
        };
        let version = Self::version_of(&entry);
        map.insert(path.clone(), entry);
        Ok(version)
    }

    fn open_stream(&self, path: &BlobPath) -> StoreResult<Box<dyn Read + Send>> {
        let map = self.objects.read().expect("lock poisoned");
        let entry = map.get(path).ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        Ok(Box::new(Cursor::new(entry.data.clone())))
    }
}

impl std::fmt::Debug for MemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlobStore")
            .field("object_count", &self.len())
            .finish()
    }
}

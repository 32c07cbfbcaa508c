//! Generic blob storage for magpie.
//!
//! Objects are addressed by a two-part [`BlobPath`] (`container/key`) and
//! externally by a scheme URL (`scheme://container/key`). The catalog and
//! the pipelines only ever talk to the [`BlobStore`] trait, which keeps them
//! agnostic of the concrete backend.
//!
//! # Backends
//!
//! - [`MemoryBlobStore`] — HashMap-based store for tests and embedding
//! - [`FsBlobStore`] — directory-per-container filesystem store, the default
//!   registered backend
//!
//! A vendor object store (S3 and friends) slots in by implementing
//! [`BlobStore`] and registering its scheme with [`Backends`].
//!
//! # Conditional writes
//!
//! Every stored object carries an opaque [`Version`] token. Writers that
//! loaded an object earlier pass the observed token to
//! [`BlobStore::store_if_version`]; if the persisted object has drifted the
//! write fails with [`StoreError::VersionConflict`] without touching the
//! object.
//!
//! [`Version`]: magpie_types::Version

pub mod error;
pub mod fs;
pub mod memory;
pub mod path;
pub mod registry;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use path::{make_url, parse_url, BlobPath};
pub use registry::Backends;
pub use traits::BlobStore;

//! Foundation types for magpie.
//!
//! This crate provides the data model shared by every other magpie crate:
//!
//! - [`Dump`] — one extracted, sanitized copy of a database, addressed by a
//!   storage URL
//! - [`Stash`] — a named catalog of dumps and the tags pointing at them
//! - [`Version`] — an opaque storage version token used for conflict
//!   detection when the catalog document is written back

pub mod dump;
pub mod stash;
pub mod version;

pub use dump::{generate_dump_filename, Dump};
pub use stash::Stash;
pub use version::Version;

//! Catalog persistence for magpie.
//!
//! A [`Stash`] catalog lives as one JSON document at
//! `<name>/_metadata.json` in blob storage. This crate provides
//! [`CatalogRepo`] for loading and saving that document with
//! version-token conflict detection, and a bounded-retry update loop for
//! the load–mutate–save cycle.
//!
//! No lock is held across the cycle: independent processes may add dumps to
//! the same catalog concurrently, and safety rests entirely on the
//! conditional write at save time.
//!
//! [`Stash`]: magpie_types::Stash

pub mod error;
pub mod repo;

pub use error::{CatalogError, CatalogResult};
pub use repo::{CatalogRepo, DEFAULT_UPDATE_TRIES};

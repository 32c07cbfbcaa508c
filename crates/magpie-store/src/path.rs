//! Blob paths and storage URLs.
//!
//! A blob is addressed inside a backend by a [`BlobPath`] (a container name
//! plus an object key) and across backends by a storage URL of the form
//! `scheme://container/key`. Keys may themselves contain slashes.

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// A two-part blob address: `(container, key)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobPath {
    /// The container (bucket) the object lives in.
    pub container: String,
    /// The object key within the container. May contain `/`.
    pub key: String,
}

impl BlobPath {
    /// Build a path from container and key parts.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Parse a `container/key…` path. Splits on the first `/`.
    pub fn parse(path: &str) -> StoreResult<Self> {
        match path.split_once('/') {
            Some((container, key)) if !container.is_empty() && !key.is_empty() => {
                Ok(Self::new(container, key))
            }
            _ => Err(StoreError::InvalidUrl {
                url: path.to_string(),
            }),
        }
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// Parse a storage URL into its scheme and blob path. Splits on the first
/// `://`; anything else fails as [`StoreError::InvalidUrl`].
pub fn parse_url(url: &str) -> StoreResult<(String, BlobPath)> {
    let (scheme, rest) = url.split_once("://").ok_or_else(|| StoreError::InvalidUrl {
        url: url.to_string(),
    })?;
    if scheme.is_empty() {
        return Err(StoreError::InvalidUrl {
            url: url.to_string(),
        });
    }
    let path = BlobPath::parse(rest).map_err(|_| StoreError::InvalidUrl {
        url: url.to_string(),
    })?;
    Ok((scheme.to_string(), path))
}

/// Render a storage URL from a scheme and a blob path. The scheme is not
/// validated here; use [`Backends::make_url`] to reject unregistered
/// schemes.
///
/// [`Backends::make_url`]: crate::registry::Backends::make_url
pub fn make_url(scheme: &str, path: &BlobPath) -> String {
    format!("{scheme}://{path}")
}

//! Opaque storage version tokens.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque version token for a stored object, compared at write time to
/// detect concurrent modification (an ETag equivalent).
///
/// Tokens are produced by a storage backend and must only be compared
/// against tokens from the same backend; their contents carry no meaning to
/// callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version(String);

impl Version {
    /// Wrap a backend-produced token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Version {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Version {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_token_equality() {
        assert_eq!(Version::new("g1"), Version::from("g1"));
        assert_ne!(Version::new("g1"), Version::new("g2"));
    }

    #[test]
    fn display_is_raw_token() {
        assert_eq!(Version::new("abc123").to_string(), "abc123");
    }
}

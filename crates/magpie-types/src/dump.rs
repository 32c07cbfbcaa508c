//! The [`Dump`] record and dump id/filename generation.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One extracted, sanitized copy of a database's state.
///
/// Dumps are immutable: they are created once by [`Stash::add_dump`] and
/// referenced by id thereafter, never modified.
///
/// [`Stash::add_dump`]: crate::Stash::add_dump
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dump {
    /// Short unique dump id.
    pub dump_id: String,

    /// URL of the dump payload in blob storage.
    pub storage_url: String,

    /// When the dump was created (ISO-8601, UTC).
    pub timestamp: String,
}

impl Dump {
    /// Create a dump record with a freshly generated id and the current
    /// UTC timestamp.
    pub fn new(storage_url: impl Into<String>) -> Self {
        Self {
            dump_id: generate_dump_id(),
            storage_url: storage_url.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Generate a short unique dump id (8 hex characters).
pub fn generate_dump_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Generate a unique dump filename of the form
/// `<uuid>_<YYYYmmdd_HHMMSS>.dump`.
pub fn generate_dump_filename() -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("{}_{stamp}.dump", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_id_is_short_hex() {
        let id = generate_dump_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn dump_ids_are_unique() {
        let a = generate_dump_id();
        let b = generate_dump_id();
        assert_ne!(a, b);
    }

    #[test]
    fn filename_shape() {
        let name = generate_dump_filename();
        assert!(name.ends_with(".dump"));
        let stem = name.strip_suffix(".dump").unwrap();
        let (hex, stamp) = stem.split_at(32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        // `_YYYYmmdd_HHMMSS`
        assert_eq!(stamp.len(), 16);
        assert!(stamp.starts_with('_'));
    }

    #[test]
    fn new_dump_carries_iso_timestamp() {
        let dump = Dump::new("fs://bucket/a.dump");
        assert!(chrono::DateTime::parse_from_rfc3339(&dump.timestamp).is_ok());
        assert_eq!(dump.storage_url, "fs://bucket/a.dump");
    }

    #[test]
    fn wire_field_names_are_fixed() {
        let dump = Dump {
            dump_id: "ab12cd34".into(),
            storage_url: "fs://bucket/a.dump".into(),
            timestamp: "2020-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["dump_id"], "ab12cd34");
        assert_eq!(json["storage_url"], "fs://bucket/a.dump");
        assert_eq!(json["timestamp"], "2020-01-01T00:00:00Z");
    }
}

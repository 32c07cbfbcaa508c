//! The [`Stash`] catalog: a named registry of dumps and tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dump::Dump;
use crate::version::Version;

/// A named catalog of dumps and the tags pointing at them.
///
/// The catalog is loaded as a whole document, mutated in memory by one
/// logical operation, and persisted as a whole-document overwrite guarded by
/// version-token comparison. Dump ids are unique within a catalog; a tag
/// maps to a dump id present in `dumps` at the time it is applied; a dump
/// removed out-of-band can leave a dangling tag behind, which is an
/// accepted limitation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stash {
    /// The catalog name (also the storage container it lives in).
    pub name: String,

    /// Mapping of tag -> dump id.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Dumps in the catalog, in insertion order.
    #[serde(default)]
    pub dumps: Vec<Dump>,

    /// Storage version observed when this copy was loaded. Managed by the
    /// catalog repository; `None` for a catalog that has never been
    /// persisted.
    #[serde(skip)]
    pub version: Option<Version>,
}

impl Stash {
    /// Create a fresh empty catalog with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a new dump pointing at `storage_url` and return it.
    pub fn add_dump(&mut self, storage_url: impl Into<String>) -> Dump {
        let dump = Dump::new(storage_url);
        self.dumps.push(dump.clone());
        dump
    }

    /// Apply one or more tags to a dump. Additive: new tags are added and
    /// existing tags are re-pointed, but tags on other dumps are never
    /// cleared.
    pub fn tag_dump<S: AsRef<str>>(&mut self, dump: &Dump, tags: &[S]) {
        for tag in tags {
            self.tags
                .insert(tag.as_ref().to_string(), dump.dump_id.clone());
        }
    }

    /// Look up a dump by id or tag. Tags are resolved first; an argument
    /// matching no tag is treated as a literal dump id.
    pub fn get_dump(&self, id_or_tag: &str) -> Option<&Dump> {
        let dump_id = self
            .tags
            .get(id_or_tag)
            .map(String::as_str)
            .unwrap_or(id_or_tag);
        self.dumps.iter().find(|d| d.dump_id == dump_id)
    }

    /// All tags currently pointing at the given dump id.
    pub fn get_tags(&self, dump_id: &str) -> Vec<String> {
        self.tags
            .iter()
            .filter(|(_, id)| id.as_str() == dump_id)
            .map(|(tag, _)| tag.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stash_is_empty() {
        let stash = Stash::new("reviews");
        assert_eq!(stash.name, "reviews");
        assert!(stash.tags.is_empty());
        assert!(stash.dumps.is_empty());
        assert!(stash.version.is_none());
    }

    #[test]
    fn add_dump_appends_and_returns() {
        let mut stash = Stash::new("reviews");
        let dump = stash.add_dump("fs://reviews/a.dump");
        assert_eq!(stash.dumps.len(), 1);
        assert_eq!(stash.dumps[0], dump);
    }

    #[test]
    fn tags_resolve_to_the_tagged_dump() {
        let mut stash = Stash::new("reviews");
        let dump = stash.add_dump("fs://reviews/a.dump");
        stash.tag_dump(&dump, &["a", "b"]);

        assert_eq!(stash.get_dump("a").unwrap().dump_id, dump.dump_id);
        assert_eq!(stash.get_dump("b").unwrap().dump_id, dump.dump_id);

        let mut tags = stash.get_tags(&dump.dump_id);
        tags.sort();
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn lookup_by_literal_id_still_works() {
        let mut stash = Stash::new("reviews");
        let dump = stash.add_dump("fs://reviews/a.dump");
        assert_eq!(
            stash.get_dump(&dump.dump_id).unwrap().storage_url,
            "fs://reviews/a.dump"
        );
    }

    #[test]
    fn unknown_id_or_tag_is_none() {
        let stash = Stash::new("reviews");
        assert!(stash.get_dump("nope").is_none());
    }

    #[test]
    fn tagging_is_additive_across_dumps() {
        let mut stash = Stash::new("reviews");
        let dump1 = stash.add_dump("fs://reviews/one.dump");
        let dump2 = stash.add_dump("fs://reviews/two.dump");

        stash.tag_dump(&dump1, &["a", "c"]);
        stash.tag_dump(&dump2, &["a"]);

        // "a" moved to dump2, "c" still resolves to dump1.
        assert_eq!(stash.get_dump("a").unwrap().dump_id, dump2.dump_id);
        assert_eq!(stash.get_dump("c").unwrap().dump_id, dump1.dump_id);
        assert_eq!(stash.get_tags(&dump1.dump_id), vec!["c"]);
        assert_eq!(stash.get_tags(&dump2.dump_id), vec!["a"]);
    }

    #[test]
    fn retagging_moves_only_that_tag() {
        let mut stash = Stash::new("reviews");
        let dump1 = stash.add_dump("fs://reviews/one.dump");
        let dump2 = stash.add_dump("fs://reviews/two.dump");
        stash.tag_dump(&dump1, &["latest", "stable"]);
        stash.tag_dump(&dump2, &["latest"]);

        assert_eq!(stash.get_dump("latest").unwrap().dump_id, dump2.dump_id);
        assert_eq!(stash.get_dump("stable").unwrap().dump_id, dump1.dump_id);
    }

    #[test]
    fn catalog_document_wire_format() {
        let mut stash = Stash::new("reviews");
        let dump = stash.add_dump("fs://reviews/a.dump");
        stash.tag_dump(&dump, &["latest"]);

        let json = serde_json::to_value(&stash).unwrap();
        assert_eq!(json["name"], "reviews");
        assert_eq!(json["tags"]["latest"], dump.dump_id);
        assert_eq!(json["dumps"][0]["storage_url"], "fs://reviews/a.dump");
        // The version token never reaches the wire.
        assert!(json.get("version").is_none());
    }

    #[test]
    fn document_roundtrip_preserves_content() {
        let mut stash = Stash::new("reviews");
        let dump = stash.add_dump("fs://reviews/a.dump");
        stash.tag_dump(&dump, &["latest"]);

        let text = serde_json::to_string(&stash).unwrap();
        let back: Stash = serde_json::from_str(&text).unwrap();
        assert_eq!(back.name, stash.name);
        assert_eq!(back.tags, stash.tags);
        assert_eq!(back.dumps, stash.dumps);
        assert!(back.version.is_none());
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let back: Stash = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert_eq!(back.name, "bare");
        assert!(back.tags.is_empty());
        assert!(back.dumps.is_empty());
    }
}

//! # tree: path-aware rewriting of document-analysis output
//!
//! A document tree is a plain [`serde_json::Value`]: objects, arrays and scalars
//! nested to any depth. The crate builds `serde_json` with `preserve_order`, so
//! objects keep the key order the analysis service produced and rewritten trees
//! serialize deterministically.
//!
//! Two transformations live here:
//! - [`project`] builds a new tree holding only the keys named by a [`KeySet`]
//!   (bare key or full dotted path), keeping the nesting that leads to them.
//! - [`prune`] deletes keys in place and, for `tables`, `paragraphs` and `cells`,
//!   hoists `page_number` out of each element's `bounding_regions` before
//!   dropping the regions.
//!
//! [`collect_key_paths`] lists every dotted path in a tree, which is the usual
//! first step when deciding what to put in a selection or removal set.
//!
//! Recursion depth follows the depth of the tree. Trees decoded by `serde_json`
//! are already bounded by its parser recursion limit.

mod paths;
mod project;
mod prune;

pub use paths::{collect_key_paths, key_paths};
pub use project::project;
pub use prune::{prune, pruned, HOIST_KEYS};

use std::collections::HashSet;

/// A set of bare key names and/or dotted paths used to select or remove entries.
///
/// A key matches when either its bare name or its full dotted path is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: HashSet<String>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// True when `key` or `path` is in the set.
    pub fn matches(&self, key: &str, path: &str) -> bool {
        self.keys.contains(key) || self.keys.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for KeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for KeySet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.keys.extend(iter.into_iter().map(Into::into));
    }
}

impl serde::Serialize for KeySet {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut sorted: Vec<&String> = self.keys.iter().collect();
        sorted.sort();
        serializer.collect_seq(sorted)
    }
}

impl<'de> serde::Deserialize<'de> for KeySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<String>::deserialize(deserializer)?;
        Ok(keys.into_iter().collect())
    }
}

/// Dotted path of `key` under `parent`; just `key` at the root.
pub fn child_path(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{parent}.{key}"),
        _ => key.to_string(),
    }
}

use serde_json::Value;
use tracing::debug;

use super::{child_path, KeySet};

/// Collections whose elements get `page_number` hoisted out of `bounding_regions`.
pub const HOIST_KEYS: [&str; 3] = ["tables", "paragraphs", "cells"];

const BOUNDING_REGIONS: &str = "bounding_regions";
const PAGE_NUMBER: &str = "page_number";

/// Remove every entry whose bare key or dotted path is in `removal`, and flatten
/// page numbers onto table, paragraph and cell elements.
///
/// Array elements share the path of the key that holds the array, so
/// `pages.spans` removes `spans` from every element of `pages`.
///
/// For an entry named `tables`, `paragraphs` or `cells` holding an array, every
/// object element with a `bounding_regions` entry receives the `page_number` of
/// the last region that has one, and loses `bounding_regions`. The hoist runs
/// before the element itself is visited, so a removal set naming `page_number`
/// still strips the hoisted value.
///
/// Shape mismatches are not errors: a `bounding_regions` that is not an array, or
/// regions that are not objects, contribute no page number and the regions are
/// still dropped.
///
/// The tree is modified in place and the same reference is returned. Running it
/// twice with the same set gives the same tree as running it once.
pub fn prune<'a>(tree: &'a mut Value, removal: &KeySet) -> &'a mut Value {
    prune_node(tree, removal, None);
    tree
}

/// Owning form of [`prune`].
pub fn pruned(mut tree: Value, removal: &KeySet) -> Value {
    prune_node(&mut tree, removal, None);
    tree
}

fn prune_node(node: &mut Value, removal: &KeySet, parent: Option<&str>) {
    match node {
        Value::Object(map) => {
            map.retain(|key, _| !removal.matches(key, &child_path(parent, key)));
            for (key, value) in map.iter_mut() {
                if HOIST_KEYS.contains(&key.as_str()) {
                    hoist_page_numbers(key, value);
                }
                let path = child_path(parent, key);
                prune_node(value, removal, Some(&path));
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                prune_node(item, removal, parent);
            }
        }
        _ => {}
    }
}

fn hoist_page_numbers(collection_key: &str, collection: &mut Value) {
    let Some(elements) = collection.as_array_mut() else {
        return;
    };

    for element in elements.iter_mut().filter_map(Value::as_object_mut) {
        let page_number = match element.get(BOUNDING_REGIONS) {
            Some(regions) => last_page_number(collection_key, regions),
            None => continue,
        };

        element.retain(|key, _| key != BOUNDING_REGIONS);
        if let Some(page_number) = page_number {
            element.insert(PAGE_NUMBER.to_string(), page_number);
        }
    }
}

// Last region wins when several carry a page number.
fn last_page_number(collection_key: &str, regions: &Value) -> Option<Value> {
    let Some(regions) = regions.as_array() else {
        debug!(collection = collection_key, "bounding_regions is not an array, no page number hoisted");
        return None;
    };
    regions
        .iter()
        .filter_map(|region| region.as_object()?.get(PAGE_NUMBER))
        .last()
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removal_applies_inside_arrays_at_any_depth() {
        let mut tree = json!({
            "pages": [{"words": [{"content": "a", "confidence": 0.9}], "confidence": 1.0}]
        });
        let removal: KeySet = ["confidence"].into_iter().collect();
        prune(&mut tree, &removal);
        assert_eq!(tree, json!({"pages": [{"words": [{"content": "a"}]}]}));
    }

    #[test]
    fn non_array_bounding_regions_is_dropped_without_page_number() {
        let mut tree = json!({"cells": [{"content": "x", "bounding_regions": "oops"}]});
        prune(&mut tree, &KeySet::new());
        assert_eq!(tree, json!({"cells": [{"content": "x"}]}));
    }

    #[test]
    fn non_object_regions_are_ignored() {
        let mut tree = json!({
            "paragraphs": [{"bounding_regions": [7, {"page_number": 2}, null]}]
        });
        prune(&mut tree, &KeySet::new());
        assert_eq!(tree, json!({"paragraphs": [{"page_number": 2}]}));
    }

    #[test]
    fn hoist_ignores_collections_that_are_not_arrays() {
        let mut tree = json!({"tables": {"bounding_regions": [{"page_number": 1}]}});
        let before = tree.clone();
        prune(&mut tree, &KeySet::new());
        assert_eq!(tree, before);
    }

    #[test]
    fn removed_collection_is_not_hoisted() {
        let mut tree = json!({"tables": [{"bounding_regions": [{"page_number": 1}]}], "x": 1});
        let removal: KeySet = ["tables"].into_iter().collect();
        prune(&mut tree, &removal);
        assert_eq!(tree, json!({"x": 1}));
    }

    #[test]
    fn dotted_path_removes_only_that_location() {
        let mut tree = json!({"a": {"b": 1, "c": {"b": 2}}});
        let removal: KeySet = ["a.c.b"].into_iter().collect();
        prune(&mut tree, &removal);
        assert_eq!(tree, json!({"a": {"b": 1, "c": {}}}));
    }
}

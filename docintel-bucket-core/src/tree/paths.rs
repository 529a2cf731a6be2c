use std::collections::BTreeSet;

use serde_json::Value;

use super::child_path;

/// Add every dotted key path found in `tree` to `paths`.
///
/// Array elements are walked under the path of the key holding the array, so a
/// list of paragraphs contributes `paragraphs.content` once no matter how many
/// paragraphs there are. The accumulator belongs to the caller; passing a fresh
/// set per call keeps separate trees from leaking into each other.
pub fn collect_key_paths(tree: &Value, paths: &mut BTreeSet<String>) {
    walk(tree, None, paths);
}

/// Every dotted key path in `tree`, sorted.
pub fn key_paths(tree: &Value) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    collect_key_paths(tree, &mut paths);
    paths
}

fn walk(node: &Value, parent: Option<&str>, paths: &mut BTreeSet<String>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                let path = child_path(parent, key);
                walk(value, Some(&path), paths);
                paths.insert(path);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, parent, paths);
            }
        }
        _ => {}
    }
}

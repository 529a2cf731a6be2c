use serde_json::{Map, Value};

use super::{child_path, KeySet};

/// Build a new tree containing only the entries selected by `selection`.
///
/// At every object, an entry whose bare key or dotted path is selected is copied
/// with its whole subtree. An unselected entry holding an object is replaced by
/// the projection of that object, even if nothing inside matched, so the shape
/// leading to deeper matches survives. An unselected entry holding an array keeps
/// the projections of its object elements, and only if there is at least one;
/// scalar elements are dropped. Unselected scalars never appear in the output.
///
/// Array elements share the path of the key that holds the array.
///
/// `tree` is left untouched. A top-level array projects each of its object
/// elements; a top-level scalar projects to an empty object.
pub fn project(tree: &Value, selection: &KeySet) -> Value {
    match tree {
        Value::Object(map) => Value::Object(project_map(map, selection, None)),
        Value::Array(items) => Value::Array(project_items(items, selection, None)),
        _ => Value::Object(Map::new()),
    }
}

fn project_map(map: &Map<String, Value>, selection: &KeySet, parent: Option<&str>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in map {
        let path = child_path(parent, key);

        if selection.matches(key, &path) {
            // Selected entries keep their whole subtree, unfiltered.
            out.insert(key.clone(), value.clone());
            continue;
        }

        match value {
            Value::Object(inner) => {
                out.insert(key.clone(), Value::Object(project_map(inner, selection, Some(&path))));
            }
            Value::Array(items) => {
                let projected = project_items(items, selection, Some(&path));
                if !projected.is_empty() {
                    out.insert(key.clone(), Value::Array(projected));
                }
            }
            _ => {}
        }
    }

    out
}

fn project_items(items: &[Value], selection: &KeySet, path: Option<&str>) -> Vec<Value> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| Value::Object(project_map(item, selection, path)))
        .collect()
}

use docintel_bucket_core::tree::{project, KeySet};
use serde_json::{json, Value};

fn keys(items: &[&str]) -> KeySet {
    items.iter().copied().collect()
}

fn sample_analysis() -> Value {
    json!({
        "api_version": "2023-07-31",
        "model_id": "prebuilt-layout",
        "content": "Invoice 42\nTotal 10.00",
        "pages": [
            {
                "page_number": 1,
                "width": 8.5,
                "lines": [{"content": "Invoice 42", "polygon": [1, 2, 3, 4]}],
                "spans": [{"offset": 0, "length": 10}]
            }
        ],
        "paragraphs": [
            {"content": "Invoice 42", "role": "title", "spans": [{"offset": 0, "length": 10}]}
        ],
        "styles": []
    })
}

#[test]
fn scenario_nested_key_pulls_parent_shape() {
    let tree = json!({"a": 1, "b": {"c": 2}});
    assert_eq!(project(&tree, &keys(&["c"])), json!({"b": {"c": 2}}));
}

#[test]
fn empty_selection_keeps_no_scalars() {
    let projected = project(&sample_analysis(), &KeySet::new());

    fn has_scalar(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.values().any(has_scalar),
            Value::Array(items) => items.iter().any(has_scalar),
            _ => true,
        }
    }
    assert!(!has_scalar(&projected), "unexpected scalar in {projected}");
    // Array skeletons survive only when they held objects.
    assert!(projected.get("pages").is_some());
    assert!(projected.get("styles").is_none());
}

#[test]
fn top_level_keys_keep_their_whole_subtree() {
    let tree = sample_analysis();
    let projected = project(&tree, &keys(&["content", "pages"]));

    assert_eq!(projected["content"], tree["content"]);
    assert_eq!(projected["pages"], tree["pages"]);
    assert!(projected.get("api_version").is_none());
    assert!(projected.get("model_id").is_none());
}

#[test]
fn dotted_path_matches_only_that_location() {
    let tree = sample_analysis();
    let projected = project(&tree, &keys(&["paragraphs.content"]));

    assert_eq!(projected["paragraphs"], json!([{"content": "Invoice 42", "spans": [{}]}]));
    assert!(projected.get("content").is_none(), "root content must not match paragraphs.content");
    assert_eq!(projected["pages"], json!([{"lines": [{}], "spans": [{}]}]));
}

#[test]
fn bare_key_matches_at_every_depth() {
    let tree = sample_analysis();
    let projected = project(&tree, &keys(&["content"]));

    assert_eq!(projected["content"], tree["content"]);
    assert_eq!(projected["pages"][0]["lines"][0]["content"], json!("Invoice 42"));
    assert_eq!(projected["paragraphs"][0]["content"], json!("Invoice 42"));
}

#[test]
fn unmatched_objects_stay_as_empty_skeletons() {
    let tree = json!({"meta": {"author": "x"}, "title": "t"});
    assert_eq!(project(&tree, &keys(&["title"])), json!({"meta": {}, "title": "t"}));
}

#[test]
fn projection_leaves_input_untouched() {
    let tree = sample_analysis();
    let snapshot = tree.clone();
    let _ = project(&tree, &keys(&["content", "pages.spans", "role"]));
    assert_eq!(tree, snapshot);
}

#[test]
fn projection_preserves_key_order() {
    let tree = json!({"z": {"k": 1}, "a": {"k": 2}, "m": {"k": 3}});
    let projected = project(&tree, &keys(&["k"]));
    let order: Vec<&String> = projected.as_object().unwrap().keys().collect();
    assert_eq!(order, ["z", "a", "m"]);
}

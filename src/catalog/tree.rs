//! Directory response shapes and the walk that flattens them into a catalog
//!
//! The directory service has answered with several envelopes over time.
//! Each recognized envelope is a `TreeShape` variant; anything else is
//! `Unrecognized` and never produces a catalog.

use crate::catalog::store::CatalogSnapshot;
use crate::core::types::{ActionId, EXCLUDED_GROUP};
use serde_json::{Map, Value};

/// A classified directory response
#[derive(Debug, Clone, PartialEq)]
pub enum TreeShape {
    /// `{"dataList": [level-1 groups]}` with `title`/`children`/`action` nodes
    DataList(Vec<Value>),
    /// An array of `{id, name, children}` nodes
    Children(Vec<Value>),
    /// A single `{id, name, children}` root node
    Root(Map<String, Value>),
    Unrecognized,
}

impl TreeShape {
    /// Classify a decoded response body
    pub fn classify(body: Value) -> Self {
        let Value::Object(mut obj) = body else {
            return TreeShape::Unrecognized;
        };

        if let Some(Value::Array(groups)) = obj.remove("dataList") {
            return TreeShape::DataList(groups);
        }

        let tree = match (obj.remove("data"), obj.remove("children")) {
            (Some(data), _) if is_present(&data) => data,
            (_, Some(children)) if is_present(&children) => children,
            _ => Value::Object(obj),
        };

        match tree {
            Value::Array(nodes) => TreeShape::Children(nodes),
            Value::Object(mut node) => match node.remove("children") {
                Some(Value::Array(nodes)) => TreeShape::Children(nodes),
                other => {
                    if let Some(children) = other {
                        node.insert("children".into(), children);
                    }
                    if node.contains_key("id") || node.contains_key("name") {
                        TreeShape::Root(node)
                    } else {
                        TreeShape::Unrecognized
                    }
                }
            },
            _ => TreeShape::Unrecognized,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TreeShape::DataList(_) => "dataList",
            TreeShape::Children(_) => "children",
            TreeShape::Root(_) => "root",
            TreeShape::Unrecognized => "unrecognized",
        }
    }

    /// Flatten into a fresh snapshot; `None` for an unrecognized shape
    pub fn into_snapshot(self) -> Option<CatalogSnapshot> {
        let mut snapshot = CatalogSnapshot::default();
        match self {
            TreeShape::DataList(groups) => walk_groups(&groups, &mut snapshot),
            TreeShape::Children(nodes) => walk_nodes(&nodes, None, &mut snapshot),
            TreeShape::Root(root) => walk_node(&root, None, &mut snapshot),
            TreeShape::Unrecognized => return None,
        }
        Some(snapshot)
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Integer or integer-looking string
pub fn coerce_action_id(value: &Value) -> Option<ActionId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn title_of(node: &Map<String, Value>, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}

fn children_of<'a>(node: &'a Map<String, Value>) -> Option<&'a [Value]> {
    match node.get("children") {
        None | Some(Value::Null) => Some(&[]),
        Some(Value::Array(children)) => Some(children),
        Some(_) => None,
    }
}

/// Level 1 → level 2 → level 3; only level-3 leaves become entries
fn walk_groups(groups: &[Value], snapshot: &mut CatalogSnapshot) {
    for first in groups.iter().filter_map(Value::as_object) {
        let (Some(first_title), Some(seconds)) = (title_of(first, "title"), children_of(first))
        else {
            continue;
        };
        if first_title == EXCLUDED_GROUP {
            continue;
        }

        for second in seconds.iter().filter_map(Value::as_object) {
            let (Some(second_title), Some(leaves)) = (title_of(second, "title"), children_of(second))
            else {
                continue;
            };
            if second_title == EXCLUDED_GROUP {
                continue;
            }

            for leaf in leaves.iter().filter_map(Value::as_object) {
                let Some(leaf_title) = title_of(leaf, "title") else {
                    continue;
                };
                if leaf_title == EXCLUDED_GROUP {
                    continue;
                }
                let Some(action_id) = leaf.get("action").and_then(coerce_action_id) else {
                    continue;
                };
                let full_path = format!("{}-{}", first_title, leaf_title);
                snapshot.insert(leaf_title, action_id, full_path);
            }
        }
    }
}

fn walk_nodes(nodes: &[Value], top: Option<&str>, snapshot: &mut CatalogSnapshot) {
    for node in nodes.iter().filter_map(Value::as_object) {
        walk_node(node, top, snapshot);
    }
}

/// Recursive `{id, name, children}` walk; every named node with an id is an entry
fn walk_node(node: &Map<String, Value>, top: Option<&str>, snapshot: &mut CatalogSnapshot) {
    let name = title_of(node, "name");
    if name.as_deref() == Some(EXCLUDED_GROUP) {
        return;
    }

    if let (Some(name), Some(action_id)) = (&name, node.get("id").and_then(coerce_action_id)) {
        let full_path = match top {
            Some(top) => format!("{}-{}", top, name),
            None => name.clone(),
        };
        snapshot.insert(name.clone(), action_id, full_path);
    }

    if let Some(children) = children_of(node) {
        walk_nodes(children, top.or(name.as_deref()), snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_list() -> Value {
        json!({
            "returnCode": 0,
            "dataList": [
                {
                    "title": "Canteen Management",
                    "children": [
                        {
                            "title": "Inspections",
                            "children": [
                                { "title": "Inspection Records", "action": 1511 },
                                { "title": "Inspection Plans", "action": "1507" },
                                { "title": "Broken", "action": "n/a" },
                                { "action": 9 }
                            ]
                        }
                    ]
                },
                {
                    "title": "Companies",
                    "children": [
                        { "title": "Registry", "children": [ { "title": "Company List", "action": 7 } ] }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_classify_data_list() {
        assert!(matches!(TreeShape::classify(data_list()), TreeShape::DataList(_)));
    }

    #[test]
    fn test_classify_children_variants() {
        let nested = json!({"data": {"children": [{"id": 1, "name": "A"}]}});
        assert!(matches!(TreeShape::classify(nested), TreeShape::Children(_)));

        let flat = json!({"children": [{"id": 1, "name": "A"}]});
        assert!(matches!(TreeShape::classify(flat), TreeShape::Children(_)));

        let list = json!({"data": [{"id": 1, "name": "A"}]});
        assert!(matches!(TreeShape::classify(list), TreeShape::Children(_)));
    }

    #[test]
    fn test_classify_root_and_unrecognized() {
        let root = json!({"data": {"id": 1, "name": "Root"}});
        assert!(matches!(TreeShape::classify(root), TreeShape::Root(_)));

        assert_eq!(TreeShape::classify(json!({"returnCode": 1})), TreeShape::Unrecognized);
        assert_eq!(TreeShape::classify(json!([1, 2, 3])), TreeShape::Unrecognized);
        assert_eq!(TreeShape::classify(json!("oops")), TreeShape::Unrecognized);
    }

    #[test]
    fn test_data_list_walk() {
        let snapshot = TreeShape::classify(data_list()).into_snapshot().unwrap();

        assert_eq!(snapshot.leaf_names(), vec!["Inspection Records", "Inspection Plans"]);
        assert_eq!(snapshot.action_id("Inspection Records"), Some(1511));
        assert_eq!(snapshot.action_id("Inspection Plans"), Some(1507));
        assert_eq!(
            snapshot.full_path("Inspection Records"),
            Some("Canteen Management-Inspection Records")
        );
        assert_eq!(snapshot.action_id("Company List"), None);
        assert_eq!(snapshot.action_id("Broken"), None);
    }

    #[test]
    fn test_duplicate_leaf_last_write_wins() {
        let body = json!({
            "dataList": [
                { "title": "Canteen", "children": [
                    { "title": "Ops", "children": [ { "title": "Reports", "action": 1 } ] }
                ]},
                { "title": "Finance", "children": [
                    { "title": "Ledger", "children": [ { "title": "Reports", "action": 2 } ] }
                ]}
            ]
        });
        let snapshot = TreeShape::classify(body).into_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.action_id("Reports"), Some(2));
        assert_eq!(snapshot.full_path("Reports"), Some("Finance-Reports"));
    }

    #[test]
    fn test_nested_children_walk_skips_excluded_subtree() {
        let body = json!({
            "children": [
                { "id": 10, "name": "Canteen", "children": [
                    { "id": 11, "name": "Menus", "children": [ { "id": 12, "name": "Daily Menu" } ] }
                ]},
                { "id": 20, "name": "Companies", "children": [ { "id": 21, "name": "Hidden" } ] }
            ]
        });
        let snapshot = TreeShape::classify(body).into_snapshot().unwrap();
        assert_eq!(snapshot.action_id("Daily Menu"), Some(12));
        assert_eq!(snapshot.full_path("Daily Menu"), Some("Canteen-Daily Menu"));
        assert_eq!(snapshot.full_path("Canteen"), Some("Canteen"));
        assert_eq!(snapshot.action_id("Hidden"), None);
        assert_eq!(snapshot.action_id("Companies"), None);
    }

    #[test]
    fn test_unrecognized_has_no_snapshot() {
        assert!(TreeShape::Unrecognized.into_snapshot().is_none());
    }

    #[test]
    fn test_coerce_action_id() {
        assert_eq!(coerce_action_id(&json!(5)), Some(5));
        assert_eq!(coerce_action_id(&json!(" 42 ")), Some(42));
        assert_eq!(coerce_action_id(&json!(1.5)), None);
        assert_eq!(coerce_action_id(&json!("abc")), None);
        assert_eq!(coerce_action_id(&json!(null)), None);
    }
}

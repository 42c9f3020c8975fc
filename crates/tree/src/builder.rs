use crate::error::{Result, TreeError};
use crate::profile::TreeProfile;
use crate::types::{Node, Tree};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Raw backend payload, tagged by shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TreeSource {
    /// Recursively nested categories; the root title comes from the caller
    Nested { root_title: String, data: Value },

    /// Parallel title/count/record-id maps keyed by dot paths (`"0"`, `"0.1"`, ...)
    Flat { data: Value },
}

/// Build drill-down trees from backend payloads
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    profile: TreeProfile,
}

/// Flat-mode node under construction: children are arena indices until assembly
struct PendingNode {
    node: Node,
    children: Vec<usize>,
}

impl TreeBuilder {
    pub fn new(profile: TreeProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &TreeProfile {
        &self.profile
    }

    /// Build a tree from either payload shape.
    ///
    /// An `Err` is the "no tree" outcome: callers show a no-data state.
    pub fn build(&self, source: &TreeSource) -> Result<Tree> {
        match source {
            TreeSource::Nested { root_title, data } => self.build_nested(root_title, data),
            TreeSource::Flat { data } => self.build_flat(data),
        }
    }

    /// Nested-object mode.
    ///
    /// `count` is the node's own record count plus the children's counts, and
    /// `record_ids` is own ids followed by every descendant's ids in child order.
    pub fn build_nested(&self, root_title: &str, data: &Value) -> Result<Tree> {
        let Value::Object(obj) = data else {
            return Err(TreeError::NotAnObject("nested payload".to_string()));
        };
        let root = self.nested_node(root_title, obj);
        debug!(
            "Built nested tree '{}': {} nodes, {} records",
            root.title,
            root.size(),
            root.count
        );
        Ok(Tree::new(root))
    }

    fn nested_node(&self, title: &str, obj: &Map<String, Value>) -> Node {
        let keys = self.profile.nested();
        let mut record_ids = obj
            .get(&keys.records_key)
            .map(record_list)
            .unwrap_or_default();
        let mut count = record_ids.len() as u64;

        let mut children = Vec::new();
        for (key, value) in obj {
            if *key == keys.records_key || *key == keys.ignored_key {
                continue;
            }
            let child = match value {
                Value::Object(child_obj) => self.nested_node(key, child_obj),
                _ => Node::new(key.as_str(), 0),
            };
            count += child.count;
            children.push(child);
        }

        for child in &children {
            record_ids.extend(child.record_ids.iter().cloned());
        }

        Node {
            title: title.to_string(),
            count,
            record_ids,
            children,
        }
    }

    /// Flat dot-path mode over a backend response holding the profile's fields.
    pub fn build_flat(&self, response: &Value) -> Result<Tree> {
        let fields = self.profile.flat();
        let Value::Object(obj) = response else {
            return Err(TreeError::NotAnObject("flat payload".to_string()));
        };

        let titles = required_map(obj, &fields.titles_field)?;
        let counts = required_map(obj, &fields.counts_field)?;
        let records = match obj.get(&fields.records_field) {
            Some(Value::Object(map)) => Some(map),
            Some(Value::Null) | None => None,
            Some(_) => {
                warn!(
                    "Ignoring '{}': expected an object keyed by dot path",
                    fields.records_field
                );
                None
            }
        };

        self.build_flat_maps(titles, counts, records)
    }

    /// Flat dot-path mode over the three parallel maps.
    ///
    /// Keys are processed by ascending segment count, so every parent is built
    /// before its children; siblings keep the maps' iteration order. A key whose
    /// parent was never built is dropped.
    pub fn build_flat_maps(
        &self,
        titles: &Map<String, Value>,
        counts: &Map<String, Value>,
        records: Option<&Map<String, Value>>,
    ) -> Result<Tree> {
        let root_key = self.profile.flat().root_key.as_str();
        if !titles.contains_key(root_key) {
            return Err(TreeError::MissingRoot(root_key.to_string()));
        }

        let mut keys: Vec<&str> = titles.keys().map(String::as_str).collect();
        // Stable: equal depths keep map order.
        keys.sort_by_key(|key| key.split('.').count());

        let mut arena: Vec<PendingNode> = Vec::with_capacity(keys.len());
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(keys.len());
        let mut orphans = Vec::new();

        for key in keys {
            let parent = if key == root_key {
                None
            } else {
                let parent_key = key.rsplit_once('.').map_or("", |(parent, _)| parent);
                match index.get(parent_key) {
                    Some(&parent) => Some(parent),
                    None => {
                        orphans.push(key);
                        continue;
                    }
                }
            };

            let node = Node {
                title: title_text(titles.get(key)),
                count: coerce_count(counts.get(key)),
                record_ids: records
                    .and_then(|map| map.get(key))
                    .map(record_list)
                    .unwrap_or_default(),
                children: Vec::new(),
            };
            let slot = arena.len();
            arena.push(PendingNode {
                node,
                children: Vec::new(),
            });
            index.insert(key, slot);
            if let Some(parent) = parent {
                arena[parent].children.push(slot);
            }
        }

        if !orphans.is_empty() {
            warn!(
                "Dropped {} flat tree key(s) without a parent: {}",
                orphans.len(),
                orphans.join(", ")
            );
        }

        let Some(&root_slot) = index.get(root_key) else {
            return Err(TreeError::MissingRoot(root_key.to_string()));
        };
        let root = assemble(&mut arena, root_slot);
        debug!(
            "Built flat tree '{}': {} nodes, {} dropped",
            root.title,
            root.size(),
            orphans.len()
        );
        Ok(Tree::new(root))
    }
}

fn assemble(arena: &mut [PendingNode], slot: usize) -> Node {
    let child_slots = std::mem::take(&mut arena[slot].children);
    let children = child_slots
        .into_iter()
        .map(|child| assemble(arena, child))
        .collect();
    let mut node = std::mem::take(&mut arena[slot].node);
    node.children = children;
    node
}

fn required_map<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Map<String, Value>> {
    match obj.get(field) {
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Null) | None => Err(TreeError::MissingField(field.to_string())),
        Some(_) => Err(TreeError::NotAnObject(field.to_string())),
    }
}

fn title_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Counts may arrive as numbers or numeric strings; anything unparseable is 0.
fn coerce_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(truncate_count))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_count))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn truncate_count(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}

/// Record ids are strings; numeric ids are stringified, anything else skipped.
fn record_list(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn titles(node: &Node) -> Vec<&str> {
        node.children.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn flat_builds_children_in_order() {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0": "Root", "0.0": "Billing", "0.1": "Delivery"},
                "count": {"0": 10, "0.0": 4, "0.1": 6}
            }))
            .unwrap();

        assert_eq!(tree.title(), "Root");
        assert_eq!(tree.root().count, 10);
        assert_eq!(titles(tree.root()), vec!["Billing", "Delivery"]);
        assert_eq!(tree.root().children[0].count, 4);
        assert_eq!(tree.root().children[1].count, 6);
        assert!(tree.root().record_ids.is_empty());
    }

    #[test]
    fn flat_attaches_deep_keys_listed_before_parents() {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0.1.0": "Late", "0.1": "Delivery", "0": "Root", "0.0": "Billing"},
                "count": {}
            }))
            .unwrap();

        // Depth sort keeps map order among siblings: "0.1" precedes "0.0".
        assert_eq!(titles(tree.root()), vec!["Delivery", "Billing"]);
        assert_eq!(titles(&tree.root().children[0]), vec!["Late"]);
    }

    #[test]
    fn flat_coerces_counts() {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0": "Root", "0.0": "A", "0.1": "B", "0.2": "C", "0.3": "D", "0.4": "E"},
                "count": {"0": "12", "0.0": " 7 ", "0.1": "n/a", "0.2": 3.9, "0.3": -4, "0.4": null}
            }))
            .unwrap();

        let counts: Vec<u64> = tree.root().children.iter().map(|c| c.count).collect();
        assert_eq!(tree.root().count, 12);
        assert_eq!(counts, vec![7, 0, 3, 0, 0]);
    }

    #[test]
    fn flat_reads_record_ids_when_present() {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0": "Root", "0.0": "Billing"},
                "count": {"0": 2, "0.0": 2},
                "reg_nos": {"0.0": ["R-1", "R-1", 42]}
            }))
            .unwrap();

        assert_eq!(tree.root().children[0].record_ids, vec!["R-1", "R-1", "42"]);
        assert!(tree.root().record_ids.is_empty());
    }

    #[test]
    fn flat_drops_orphans() {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0": "Root", "0.0": "Billing", "0.5.1": "Orphan", "1": "Second root"},
                "count": {"0": 1}
            }))
            .unwrap();

        assert_eq!(tree.root().size(), 2);
        assert_eq!(titles(tree.root()), vec!["Billing"]);
    }

    #[test]
    fn flat_without_required_maps_is_no_tree() {
        let builder = TreeBuilder::default();
        assert_eq!(
            builder.build_flat(&json!({"count": {"0": 1}})).unwrap_err(),
            TreeError::MissingField("words".to_string())
        );
        assert_eq!(
            builder.build_flat(&json!({"words": {"0": "Root"}})).unwrap_err(),
            TreeError::MissingField("count".to_string())
        );
        assert_eq!(
            builder
                .build_flat(&json!({"words": {"0.0": "Billing"}, "count": {}}))
                .unwrap_err(),
            TreeError::MissingRoot("0".to_string())
        );
        assert!(builder.build_flat(&json!([1, 2])).is_err());
    }

    #[test]
    fn flat_uses_profile_field_names() {
        let builder = TreeBuilder::new(TreeProfile::builtin("grievances").unwrap());
        let tree = builder
            .build_flat(&json!({
                "words": {"0": "Root", "0.0": "Pension"},
                "count": {"0": 1, "0.0": 1},
                "registration_no": {"0.0": ["DOPPW/E/2024/0001"]}
            }))
            .unwrap();
        assert_eq!(tree.root().children[0].record_ids, vec!["DOPPW/E/2024/0001"]);
    }

    #[test]
    fn nested_sums_counts_and_concatenates_records() {
        let data = json!({
            "_records": ["a"],
            "_count": 99,
            "Billing": {
                "_records": ["b1", "b2"],
                "Refunds": {"_records": ["r1", "b1"]}
            },
            "Delivery": {"_records": ["d1"]}
        });
        let tree = TreeBuilder::default().build_nested("All", &data).unwrap();
        let root = tree.root();

        assert_eq!(root.title, "All");
        assert_eq!(titles(root), vec!["Billing", "Delivery"]);
        assert_eq!(root.count, 6);
        assert_eq!(root.record_ids, vec!["a", "b1", "b2", "r1", "b1", "d1"]);

        let billing = &root.children[0];
        assert_eq!(billing.count, 4);
        assert_eq!(billing.record_ids, vec!["b1", "b2", "r1", "b1"]);
        assert_eq!(billing.children[0].count, 2);
    }

    #[test]
    fn nested_skips_record_ids_that_are_not_strings_or_numbers() {
        let data = json!({
            "_records": ["a", null, 7, {"x": 1}],
            "Billing": {"_records": [true, "b"]}
        });
        let tree = TreeBuilder::default().build_nested("All", &data).unwrap();

        let billing = &tree.root().children[0];
        assert_eq!(billing.record_ids, vec!["b"]);
        assert_eq!(billing.count, 1);
        assert_eq!(tree.root().record_ids, vec!["a", "7", "b"]);
        assert_eq!(tree.root().count, 3);
    }

    #[test]
    fn flat_ignores_record_field_that_is_not_an_object() {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0": "Root", "0.0": "Billing"},
                "count": {"0": 2, "0.0": 2},
                "reg_nos": [1, 2]
            }))
            .unwrap();

        assert_eq!(tree.root().count, 2);
        assert_eq!(titles(tree.root()), vec!["Billing"]);
        assert!(tree.root().record_ids.is_empty());
        assert!(tree.root().children[0].record_ids.is_empty());
    }

    #[test]
    fn flat_skips_record_ids_that_are_not_strings_or_numbers() {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0": "Root"},
                "count": {"0": 4},
                "reg_nos": {"0": ["a", null, 7, {"x": 1}]}
            }))
            .unwrap();

        assert_eq!(tree.root().record_ids, vec!["a", "7"]);
        // Flat counts come from the count map, not the record list.
        assert_eq!(tree.root().count, 4);
    }

    #[test]
    fn nested_non_object_child_is_empty_leaf() {
        let tree = TreeBuilder::default()
            .build_nested("All", &json!({"Misc": null, "Other": {"_records": ["x"]}}))
            .unwrap();
        assert_eq!(tree.root().children[0], Node::new("Misc", 0));
        assert_eq!(tree.root().count, 1);
    }

    #[test]
    fn nested_rejects_non_object() {
        assert!(TreeBuilder::default()
            .build_nested("All", &json!("nope"))
            .is_err());
    }

    #[test]
    fn tagged_source_dispatches() {
        let source: TreeSource = serde_json::from_value(json!({
            "mode": "nested",
            "root_title": "Ministries",
            "data": {"Health": {"_records": ["h"]}}
        }))
        .unwrap();
        let tree = TreeBuilder::default().build(&source).unwrap();
        assert_eq!(tree.title(), "Ministries");
        assert_eq!(tree.root().count, 1);

        let source: TreeSource = serde_json::from_value(json!({
            "mode": "flat",
            "data": {"words": {"0": "Root"}, "count": {"0": "3"}}
        }))
        .unwrap();
        assert_eq!(TreeBuilder::default().build(&source).unwrap().root().count, 3);
    }

    /// Random tree shape, emitted as flat keys in breadth-first order.
    fn flat_shape() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(0usize..4, 1..30).prop_map(|fanouts| {
            let mut out = vec![("0".to_string(), "t0".to_string())];
            let mut frontier = vec!["0".to_string()];
            let mut fanouts = fanouts.into_iter();
            let mut serial = 1;
            while let Some(parent) = (!frontier.is_empty()).then(|| frontier.remove(0)) {
                let Some(n) = fanouts.next() else { break };
                for i in 0..n {
                    let key = format!("{parent}.{i}");
                    out.push((key.clone(), format!("t{serial}")));
                    serial += 1;
                    frontier.push(key);
                }
            }
            out
        })
    }

    fn nested_payload() -> impl Strategy<Value = Value> {
        let leaf = prop::collection::vec("[a-z]{1,3}", 0..4)
            .prop_map(|ids| json!({ "_records": ids }));
        leaf.prop_recursive(3, 24, 4, |inner| {
            (
                prop::collection::vec("[a-z]{1,3}", 0..4),
                prop::collection::btree_map("[A-Z][a-z]{2,5}", inner, 0..4),
            )
                .prop_map(|(ids, children)| {
                    let mut obj = Map::new();
                    obj.insert("_records".to_string(), json!(ids));
                    for (k, v) in children {
                        obj.insert(k, v);
                    }
                    Value::Object(obj)
                })
        })
    }

    fn own_records_total(value: &Value) -> u64 {
        let Value::Object(obj) = value else { return 0 };
        obj.iter()
            .map(|(k, v)| {
                if k == "_records" {
                    v.as_array().map_or(0, |a| a.len() as u64)
                } else {
                    own_records_total(v)
                }
            })
            .sum()
    }

    proptest! {
        #[test]
        fn proptest_flat_keys_resolve_to_their_titles(shape in flat_shape()) {
            let mut words = Map::new();
            let mut count = Map::new();
            for (key, title) in &shape {
                words.insert(key.clone(), json!(title));
                count.insert(key.clone(), json!(1));
            }
            let tree = TreeBuilder::default()
                .build_flat(&json!({"words": words, "count": count}))
                .unwrap();

            for (key, title) in &shape {
                let path: Vec<usize> = key
                    .split('.')
                    .skip(1)
                    .map(|s| s.parse().unwrap())
                    .collect();
                let node = tree.resolve(&path);
                prop_assert!(node.is_some(), "unresolved key {}", key);
                prop_assert_eq!(&node.unwrap().title, title);
            }
        }

        #[test]
        fn proptest_nested_root_count_is_total_own_records(data in nested_payload()) {
            let tree = TreeBuilder::default().build_nested("All", &data).unwrap();
            let total = own_records_total(&data);
            prop_assert_eq!(tree.root().count, total);
            prop_assert_eq!(tree.root().record_ids.len() as u64, total);
        }
    }
}

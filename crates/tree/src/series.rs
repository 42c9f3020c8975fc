use crate::types::Node;
use serde::{Deserialize, Serialize};

/// One chart entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u64,
}

/// Chart series for a branch: one point per child, in child order.
///
/// A leaf yields a single point for itself, so the chart is never empty.
pub fn project(node: &Node) -> Vec<SeriesPoint> {
    if node.is_leaf() {
        return vec![SeriesPoint {
            label: node.title.clone(),
            value: node.count,
        }];
    }
    node.children
        .iter()
        .map(|child| SeriesPoint {
            label: child.title.clone(),
            value: child.count,
        })
        .collect()
}

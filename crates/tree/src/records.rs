use crate::types::Node;
use serde::{Deserialize, Serialize};

/// One page of record ids under a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPage {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub ids: Vec<String>,
}

/// Zero-based page of `node.record_ids`. Duplicates count as separate records.
pub fn page_records(node: &Node, page: usize, page_size: usize) -> RecordPage {
    let page_size = page_size.max(1);
    let total = node.record_ids.len();
    let start = page.saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    RecordPage {
        page,
        page_size,
        total,
        total_pages: total.div_ceil(page_size),
        ids: node.record_ids[start..end].to_vec(),
    }
}

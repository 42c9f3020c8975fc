use crate::breadcrumb::breadcrumbs;
use crate::error::NavigationError;
use crate::records::{page_records, RecordPage};
use crate::series::{project, SeriesPoint};
use crate::types::{Node, Path, Tree};
use log::warn;
use std::sync::Arc;

/// Drill-down state over a shared tree.
///
/// The tree is read-only; the navigator owns only its path. Several navigators
/// can share one `Arc<Tree>`.
#[derive(Debug, Clone)]
pub struct PathNavigator {
    tree: Arc<Tree>,
    path: Path,
}

impl PathNavigator {
    pub fn new(tree: Arc<Tree>) -> Self {
        Self {
            tree,
            path: Path::root(),
        }
    }

    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Swap in a freshly built tree; the path resets to the root.
    pub fn replace_tree(&mut self, tree: Arc<Tree>) {
        self.tree = tree;
        self.path = Path::root();
    }

    pub fn resolve(&self, path: &Path) -> Option<&Node> {
        self.tree.resolve(path.as_slice())
    }

    /// Node at the committed path
    pub fn current(&self) -> &Node {
        let node = self.resolve(&self.path);
        debug_assert!(node.is_some(), "committed path [{}] must resolve", self.path);
        node.unwrap_or_else(|| self.tree.root())
    }

    /// Move into child `index` of the current node.
    ///
    /// The path is committed only if the extended path resolves; otherwise it
    /// is left untouched and `ReachedLeaf` is returned.
    pub fn descend(&mut self, index: usize) -> Result<&Node, NavigationError> {
        let candidate = self.path.joined(index);
        if self.tree.resolve(candidate.as_slice()).is_none() {
            let children = self.current().children.len();
            warn!(
                "leaf node reached at [{}]: cannot descend into child {index} ({children} children)",
                self.path
            );
            return Err(NavigationError::ReachedLeaf {
                path: self.path.to_string(),
                index,
                children,
            });
        }
        self.path = candidate;
        Ok(self.current())
    }

    /// Keep the first `len` segments of the path. Indices are never remapped.
    pub fn truncate(&mut self, len: usize) {
        self.path = self.path.prefix(len);
    }

    pub fn breadcrumbs(&self) -> Vec<String> {
        breadcrumbs(self.tree.root(), self.path.as_slice())
    }

    pub fn series(&self) -> Vec<SeriesPoint> {
        project(self.current())
    }

    pub fn records(&self, page: usize, page_size: usize) -> RecordPage {
        page_records(self.current(), page, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn scenario_tree() -> Arc<Tree> {
        let tree = TreeBuilder::default()
            .build_flat(&json!({
                "words": {"0": "Root", "0.0": "Billing", "0.1": "Delivery"},
                "count": {"0": 10, "0.0": 4, "0.1": 6}
            }))
            .unwrap();
        Arc::new(tree)
    }

    fn point(label: &str, value: u64) -> SeriesPoint {
        SeriesPoint {
            label: label.to_string(),
            value,
        }
    }

    #[test]
    fn root_series_lists_children() {
        let nav = PathNavigator::new(scenario_tree());
        assert!(nav.path().is_empty());
        assert_eq!(nav.series(), vec![point("Billing", 4), point("Delivery", 6)]);
        assert_eq!(nav.breadcrumbs(), vec!["Root"]);
    }

    #[test]
    fn descend_into_leaf_projects_single_point() {
        let mut nav = PathNavigator::new(scenario_tree());
        let node = nav.descend(1).unwrap();
        assert_eq!(node.title, "Delivery");

        assert_eq!(nav.path().as_slice(), &[1]);
        assert_eq!(nav.series(), vec![point("Delivery", 6)]);
        assert_eq!(nav.breadcrumbs(), vec!["Root", "Delivery"]);
    }

    #[test]
    fn truncate_to_root_restores_breadcrumb() {
        let mut nav = PathNavigator::new(scenario_tree());
        nav.descend(1).unwrap();
        nav.truncate(0);
        assert!(nav.path().is_empty());
        assert_eq!(nav.breadcrumbs(), vec!["Root"]);
    }

    #[test]
    fn descend_out_of_range_keeps_path() {
        let mut nav = PathNavigator::new(scenario_tree());
        let err = nav.descend(5).unwrap_err();
        assert_eq!(
            err,
            NavigationError::ReachedLeaf {
                path: String::new(),
                index: 5,
                children: 2
            }
        );
        assert!(nav.path().is_empty());

        nav.descend(0).unwrap();
        assert!(nav.descend(0).is_err());
        assert_eq!(nav.path().as_slice(), &[0]);
    }

    #[test]
    fn truncate_beyond_length_is_noop() {
        let mut nav = PathNavigator::new(scenario_tree());
        nav.descend(0).unwrap();
        nav.truncate(4);
        assert_eq!(nav.path().as_slice(), &[0]);
    }

    #[test]
    fn replace_tree_resets_path() {
        let mut nav = PathNavigator::new(scenario_tree());
        nav.descend(1).unwrap();
        nav.replace_tree(scenario_tree());
        assert!(nav.path().is_empty());
        assert_eq!(nav.current().title, "Root");
    }

    #[test]
    fn current_follows_committed_path_only() {
        let mut nav = PathNavigator::new(scenario_tree());
        nav.descend(0).unwrap();
        assert!(nav.descend(3).is_err());
        assert_eq!(nav.current().title, nav.resolve(nav.path()).unwrap().title);

        // A smaller tree cannot strand the old path.
        nav.replace_tree(Arc::new(Tree::new(Node::new("Solo", 0))));
        assert_eq!(nav.current().title, "Solo");
    }

    #[test]
    fn navigators_share_one_tree() {
        let tree = scenario_tree();
        let mut left = PathNavigator::new(Arc::clone(&tree));
        let right = PathNavigator::new(Arc::clone(&tree));
        left.descend(0).unwrap();
        assert_eq!(left.current().title, "Billing");
        assert_eq!(right.current().title, "Root");
        assert_eq!(Arc::strong_count(&tree), 3);
    }

    #[test]
    fn records_page_follows_current_node() {
        let tree = TreeBuilder::default()
            .build_nested(
                "All",
                &json!({"A": {"_records": ["a1", "a2", "a3"]}, "B": {"_records": ["b1"]}}),
            )
            .unwrap();
        let mut nav = PathNavigator::new(Arc::new(tree));
        assert_eq!(nav.records(0, 10).total, 4);
        nav.descend(0).unwrap();
        let page = nav.records(1, 2);
        assert_eq!(page.ids, vec!["a3"]);
        assert_eq!(page.total_pages, 2);
    }

    proptest! {
        #[test]
        fn proptest_descend_then_truncate_zero_restores_root(
            steps in prop::collection::vec(0usize..4, 0..8)
        ) {
            let mut nav = PathNavigator::new(scenario_tree());
            for step in steps {
                let _ = nav.descend(step);
            }
            nav.truncate(0);
            prop_assert!(nav.path().is_empty());
            nav.truncate(0);
            prop_assert!(nav.path().is_empty());
        }
    }
}

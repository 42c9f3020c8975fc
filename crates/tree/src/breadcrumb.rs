use crate::types::Node;

/// Titles from `root` down the path, one per resolved level.
///
/// Resolution stops at the first out-of-range index (a stale path against a
/// rebuilt tree), so the trail ends at the deepest node actually reached.
pub fn breadcrumbs(root: &Node, path: &[usize]) -> Vec<String> {
    let mut trail = Vec::with_capacity(path.len() + 1);
    trail.push(root.title.clone());

    let mut node = root;
    for &index in path {
        let Some(child) = node.children.get(index) else {
            break;
        };
        trail.push(child.title.clone());
        node = child;
    }
    trail
}

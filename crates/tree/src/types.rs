use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One labeled entry in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Node {
    /// Display title (category or topic name)
    pub title: String,

    /// Aggregate count for this node
    pub count: u64,

    /// Record identifiers aggregated at or below this node.
    /// Duplicates are kept: downstream paging relies on exact counts.
    #[serde(default)]
    pub record_ids: Vec<String>,

    /// Children in backend order
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(title: impl Into<String>, count: u64) -> Self {
        Self {
            title: title.into(),
            count,
            record_ids: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Height of the subtree rooted here (a leaf has depth 0)
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in the subtree, this one included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }
}

/// Immutable drill-down tree, rebuilt wholesale on every fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    root: Node,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn title(&self) -> &str {
        &self.root.title
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Walk from the root one index per level.
    ///
    /// Returns `None` when any index is out of range; nothing is partially resolved.
    pub fn resolve(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }
}

/// Ordered child indices from the root to the current branch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of the first `len` segments (the whole path when `len` exceeds it)
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// New path with `index` appended; `self` is left as is
    pub(crate) fn joined(&self, index: usize) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(index);
        Self(segments)
    }
}

impl From<Vec<usize>> for Path {
    fn from(segments: Vec<usize>) -> Self {
        Self(segments)
    }
}

impl AsRef<[usize]> for Path {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = std::num::ParseIntError;

    /// Parses dot-joined indices; an empty string is the root path.
    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::root());
        }
        raw.split('.')
            .map(|segment| segment.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Self)
    }
}

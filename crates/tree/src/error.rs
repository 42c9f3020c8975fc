use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Reasons a backend payload produced no tree.
///
/// Every variant means the same thing to a caller: there is no data to show.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Root key '{0}' not present")]
    MissingRoot(String),

    #[error("Expected a JSON object for {0}")]
    NotAnObject(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("leaf node at [{path}]: child {index} out of range ({children} children)")]
    ReachedLeaf {
        path: String,
        index: usize,
        children: usize,
    },
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SuggestError>;

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Invalid query pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Suggestion lookup failed: {0}")]
    Lookup(String),
}

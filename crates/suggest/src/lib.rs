//! # Drilldown Suggest
//!
//! Autocomplete ranking for long static option lists (ministries, states,
//! districts) plus a session wrapper that remembers the last suggestion set.
//!
//! ```text
//! keystroke ──> AutocompleteSession
//!                  ├─ Text      ──> SuggestionSource
//!                  │                 ├─ Static  ──> rank(): phrase pass + word pass, merged
//!                  │                 └─ Dynamic ──> SuggestionLookup (async, unranked)
//!                  └─ Selected / Empty ──> previous suggestions unchanged
//! ```

mod error;
mod ranker;
mod session;

pub use error::{Result, SuggestError};
pub use ranker::{rank, SuggestionOption, SuggestionRanker};
pub use session::{AutocompleteSession, QueryInput, SuggestionLookup, SuggestionSource};

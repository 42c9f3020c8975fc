use crate::error::Result;
use crate::ranker::{SuggestionOption, SuggestionRanker};
use async_trait::async_trait;
use log::{debug, warn};

/// What the autocomplete widget reports on each change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput<V> {
    /// Free text typed by the operator
    Text(String),
    /// An option was committed; the widget echoes it back instead of text
    Selected(SuggestionOption<V>),
    /// Input cleared or absent
    Empty,
}

/// Externally supplied option lookup (typically a remote call).
///
/// Results are shown as returned; they are not re-ranked.
#[async_trait]
pub trait SuggestionLookup<V>: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Vec<SuggestionOption<V>>>;
}

pub enum SuggestionSource<V> {
    Static(SuggestionRanker<V>),
    Dynamic(Box<dyn SuggestionLookup<V>>),
}

/// Autocomplete state for one input: the source plus the last suggestion set.
pub struct AutocompleteSession<V> {
    source: SuggestionSource<V>,
    suggestions: Vec<SuggestionOption<V>>,
}

impl<V: Clone + Send> AutocompleteSession<V> {
    pub fn new(source: SuggestionSource<V>) -> Self {
        Self {
            source,
            suggestions: Vec::new(),
        }
    }

    pub fn with_options(options: Vec<SuggestionOption<V>>) -> Self {
        Self::new(SuggestionSource::Static(SuggestionRanker::new(options)))
    }

    pub fn suggestions(&self) -> &[SuggestionOption<V>] {
        &self.suggestions
    }

    /// Refresh suggestions for one input event.
    ///
    /// Only free text changes the set. Selections, empty input and failed
    /// lookups leave the previous suggestions in place.
    pub async fn on_input(&mut self, input: QueryInput<V>) -> &[SuggestionOption<V>] {
        let query = match input {
            QueryInput::Text(query) => query,
            QueryInput::Selected(_) | QueryInput::Empty => return &self.suggestions,
        };

        match &self.source {
            SuggestionSource::Static(ranker) => {
                self.suggestions = ranker.rank(&query);
                debug!(
                    "Ranked {} of {} options for {query:?}",
                    self.suggestions.len(),
                    ranker.options().len()
                );
            }
            SuggestionSource::Dynamic(lookup) => match lookup.lookup(&query).await {
                Ok(found) => self.suggestions = found,
                Err(err) => warn!("Keeping previous suggestions for {query:?}: {err}"),
            },
        }
        &self.suggestions
    }
}

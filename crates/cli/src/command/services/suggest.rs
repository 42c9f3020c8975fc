use crate::command::domain::{SuggestOutput, SuggestPayload};
use drilldown_suggest::{rank, SuggestionOption};
use serde_json::Value;

/// Rank options for a text query. Non-text queries echo `previous` unchanged.
pub(crate) fn suggest(payload: SuggestPayload) -> SuggestOutput {
    let (mut suggestions, ranked) = match payload.query {
        Value::String(query) => {
            let options: Vec<SuggestionOption<Value>> =
                payload.options.into_iter().map(Into::into).collect();
            (rank(&options, &query), true)
        }
        _ => (
            payload.previous.into_iter().map(Into::into).collect(),
            false,
        ),
    };

    let total = suggestions.len();
    let truncated = match payload.limit {
        Some(limit) if limit < total => {
            suggestions.truncate(limit);
            true
        }
        _ => false,
    };

    SuggestOutput {
        suggestions,
        total,
        truncated,
        ranked,
    }
}

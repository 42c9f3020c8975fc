use crate::error::Result;
use log::warn;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Display text plus an opaque value handed back on selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionOption<V> {
    pub text: String,
    pub value: V,
}

impl<V> SuggestionOption<V> {
    pub fn new(text: impl Into<String>, value: V) -> Self {
        Self {
            text: text.into(),
            value,
        }
    }
}

/// Ranker over a static option list. List order breaks ties.
#[derive(Debug, Clone)]
pub struct SuggestionRanker<V> {
    options: Vec<SuggestionOption<V>>,
}

impl<V: Clone> SuggestionRanker<V> {
    pub fn new(options: Vec<SuggestionOption<V>>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &[SuggestionOption<V>] {
        &self.options
    }

    pub fn rank(&self, query: &str) -> Vec<SuggestionOption<V>> {
        rank(&self.options, query)
    }
}

/// Rank `options` against a free-text query.
///
/// 1. Phrase pass: options whose lowercased text contains the whole trimmed,
///    lowercased query, in list order.
/// 2. Word pass: every option scored by the summed match count of each query
///    word; zero scores dropped, sorted by score descending (stable).
/// 3. Result: phrase pass, then word pass minus texts already listed.
///
/// The phrase pass is a plain substring test and cannot fail. If a word
/// pattern cannot be compiled, only the phrase pass is returned.
pub fn rank<V: Clone>(options: &[SuggestionOption<V>], query: &str) -> Vec<SuggestionOption<V>> {
    let lowered = query.to_lowercase();
    let phrase = lowered.trim();

    let primary: Vec<&SuggestionOption<V>> = options
        .iter()
        .filter(|option| option.text.to_lowercase().contains(phrase))
        .collect();

    let words = match word_patterns(phrase) {
        Ok(words) => words,
        Err(err) => {
            warn!("Word pass skipped for {} byte query: {err}", query.len());
            return primary.into_iter().cloned().collect();
        }
    };

    let mut scored: Vec<(&SuggestionOption<V>, usize)> = options
        .iter()
        .map(|option| (option, occurrences(&words, &option.text)))
        .filter(|(_, score)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let listed: HashSet<&str> = primary.iter().map(|option| option.text.as_str()).collect();
    let secondary = scored
        .into_iter()
        .map(|(option, _)| option)
        .filter(|option| !listed.contains(option.text.as_str()));

    primary.iter().copied().chain(secondary).cloned().collect()
}

/// One case-insensitive literal pattern per distinct word, with its multiplicity
fn word_patterns(phrase: &str) -> Result<Vec<(Regex, usize)>> {
    let mut seen: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for word in phrase.split_whitespace() {
        match slots.get(word) {
            Some(&slot) => seen[slot].1 += 1,
            None => {
                slots.insert(word, seen.len());
                seen.push((word, 1));
            }
        }
    }

    seen.into_iter()
        .map(|(word, times)| -> Result<(Regex, usize)> {
            let pattern = RegexBuilder::new(&regex::escape(word))
                .case_insensitive(true)
                .build()?;
            Ok((pattern, times))
        })
        .collect()
}

/// Non-overlapping match count of every query word, summed
fn occurrences(words: &[(Regex, usize)], text: &str) -> usize {
    words
        .iter()
        .map(|(word, times)| word.find_iter(text).count() * times)
        .sum()
}

//! Per-entry analysis computed when a dream is submitted.

use std::collections::HashSet;

use crate::analysis::nlp::{
    phrases_containing, phrases_from_tokens, sentiment_from_tokens, tokenize, word_frequencies,
};
use crate::analysis::types::{DreamAnalysis, Theme};

/// Analyze one dream text.
pub fn analyze_dream(text: &str) -> DreamAnalysis {
    let tokens = tokenize(text);
    let phrases = phrases_from_tokens(&tokens, 2);
    let sentiment = sentiment_from_tokens(&tokens);
    let frequencies = word_frequencies(&tokens);

    let themes = frequencies
        .iter()
        .filter(|(_, count)| *count > 1)
        .map(|(word, count)| Theme {
            word: word.clone(),
            count: *count,
            related: phrases_containing(&phrases, word),
        })
        .collect();

    DreamAnalysis {
        sentiment,
        themes,
        word_frequencies: frequencies.into_iter().collect(),
        common_phrases: repeated_phrases(&phrases),
    }
}

/// Every occurrence of a phrase after its first one.
fn repeated_phrases(phrases: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    phrases
        .iter()
        .filter(|phrase| !seen.insert(phrase.as_str()))
        .cloned()
        .collect()
}

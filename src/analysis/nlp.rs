//! Tokenization, phrase extraction and lexicon sentiment.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::analysis::types::{Mood, Sentiment};

/// Characters removed before splitting into words.
const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Tokens this short carry no signal ("a", "of", "in", ...).
const MIN_TOKEN_CHARS: usize = 3;

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["happy", "joy", "peaceful", "excited", "love", "wonderful"]
        .into_iter()
        .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["scared", "afraid", "angry", "sad", "terrible", "nightmare"]
        .into_iter()
        .collect()
});

/// Lowercase, strip punctuation, split on whitespace and drop short words.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_owned)
        .collect()
}

/// Every run of `n` consecutive tokens joined by a single space.
pub fn extract_phrases(text: &str, n: usize) -> Vec<String> {
    phrases_from_tokens(&tokenize(text), n)
}

pub(crate) fn phrases_from_tokens(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    tokens.windows(n).map(|window| window.join(" ")).collect()
}

pub fn analyze_sentiment(text: &str) -> Sentiment {
    sentiment_from_tokens(&tokenize(text))
}

pub(crate) fn sentiment_from_tokens(tokens: &[String]) -> Sentiment {
    let score = tokens.iter().fold(0i32, |score, token| {
        if POSITIVE_WORDS.contains(token.as_str()) {
            score + 1
        } else if NEGATIVE_WORDS.contains(token.as_str()) {
            score - 1
        } else {
            score
        }
    });

    Sentiment {
        score,
        sentiment: Mood::from_score(score),
    }
}

/// Word counts in first-seen order.
pub(crate) fn word_frequencies(tokens: &[String]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for token in tokens {
        match index.get(token.as_str()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(token.as_str(), counts.len());
                counts.push((token.clone(), 1));
            }
        }
    }

    // array-index words ("7", "2024") list before the rest, in numeric order
    counts.sort_by_key(|(word, _)| array_index(word).map_or((1, 0), |n| (0, n)));
    counts
}

/// `word` read as a canonical array index: no sign or leading zero, below 2^32 - 1.
fn array_index(word: &str) -> Option<u32> {
    if word.len() > 1 && word.starts_with('0') {
        return None;
    }
    if !word.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    word.parse::<u32>().ok().filter(|&n| n != u32::MAX)
}

/// Phrases containing `word` anywhere, not only as a whole word.
pub(crate) fn phrases_containing(phrases: &[String], word: &str) -> Vec<String> {
    phrases
        .iter()
        .filter(|phrase| phrase.contains(word))
        .cloned()
        .collect()
}

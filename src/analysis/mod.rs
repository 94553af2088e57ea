//! # Analysis Module
//!
//! Deterministic text analysis for dream entries: tokenization, phrase
//! extraction, lexicon sentiment, per-dream themes and history-wide mood and
//! theme aggregates. Everything here is pure and total.

pub mod dream;
pub mod insights;
pub mod nlp;
pub mod types;

pub use dream::analyze_dream;
pub use insights::{
    analyze_mood_trends, analyze_recurring_themes, build_report, generate_insights, InsightsReport,
};
pub use nlp::{analyze_sentiment, extract_phrases, tokenize};
pub use types::*;

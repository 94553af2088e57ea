//! Data structures produced and consumed by the text analyzer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Mood label attached to a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Mood {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s > 0 => Mood::Positive,
            s if s < 0 => Mood::Negative,
            _ => Mood::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Negative => "negative",
            Mood::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexicon sentiment of a single text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: i32,
    pub sentiment: Mood,
}

/// A word repeated within one dream, with the phrases it shows up in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub word: String,
    pub count: usize,
    pub related: Vec<String>,
}

/// Per-entry analysis computed at submission time and stored remotely as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DreamAnalysis {
    pub sentiment: Sentiment,
    pub themes: Vec<Theme>,
    pub word_frequencies: BTreeMap<String, usize>,
    pub common_phrases: Vec<String>,
}

/// Direction of the most recent moods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTrend {
    /// Mean stored score, one decimal place.
    pub average_mood: String,
    pub trend: Trend,
    pub dominant_mood: Mood,
}

/// A word recurring across the whole dream history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTheme {
    pub theme: String,
    /// The word itself followed by every phrase containing it.
    pub keywords: Vec<String>,
    pub frequency: usize,
}

/// A stored dream as returned by `/get_dreams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamEntry {
    pub dream_text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub analysis: Option<DreamAnalysis>,
}

impl DreamEntry {
    pub fn new(dream_text: impl Into<String>, analysis: Option<DreamAnalysis>) -> Self {
        Self {
            dream_text: dream_text.into(),
            timestamp: None,
            analysis,
        }
    }

    /// Stored sentiment score, 0 when the entry carries no analysis.
    pub fn mood_score(&self) -> i32 {
        self.analysis.as_ref().map(|a| a.sentiment.score).unwrap_or(0)
    }

    /// Stored mood label, neutral when the entry carries no analysis.
    pub fn mood(&self) -> Mood {
        self.analysis
            .as_ref()
            .map(|a| a.sentiment.sentiment)
            .unwrap_or_default()
    }
}

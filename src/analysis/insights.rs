//! Aggregate insights over a user's dream history.
//!
//! Nothing here is persisted: the aggregates are recomputed from the stored
//! entries every time the history is loaded.

use std::fmt;

use serde::Serialize;

use crate::analysis::nlp::{phrases_containing, phrases_from_tokens, tokenize, word_frequencies};
use crate::analysis::types::{DreamEntry, Mood, MoodTrend, RecurringTheme, Trend};

/// How many trailing entries the trend looks at.
const TREND_WINDOW: usize = 3;
const MAX_RECURRING_THEMES: usize = 3;
const MIN_THEME_FREQUENCY: usize = 2;
/// Keywords shown per theme in the text rendering.
const DISPLAYED_KEYWORDS: usize = 5;

pub const EMPTY_HISTORY_PROMPT: &str =
    "Start recording your dreams to receive personalized insights.";

pub fn analyze_mood_trends(dreams: &[DreamEntry]) -> MoodTrend {
    if dreams.is_empty() {
        return MoodTrend {
            average_mood: "0".to_string(),
            trend: Trend::Stable,
            dominant_mood: Mood::Neutral,
        };
    }

    let scores: Vec<i32> = dreams.iter().map(DreamEntry::mood_score).collect();
    let average = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;

    MoodTrend {
        average_mood: format_one_decimal(average),
        trend: recent_trend(&scores),
        dominant_mood: dominant_mood(dreams),
    }
}

/// One decimal of the exact binary value, exact ties away from zero.
///
/// The only doubles sitting exactly halfway between two tenths are odd
/// multiples of a quarter, where `{:.1}` would round to even instead.
fn format_one_decimal(value: f64) -> String {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        let rounded = (value * 10.0).round() / 10.0;
        return format!("{rounded:.1}");
    }
    format!("{value:.1}")
}

fn recent_trend(scores: &[i32]) -> Trend {
    let window = &scores[scores.len().saturating_sub(TREND_WINDOW)..];
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() > 1 => match last.cmp(first) {
            std::cmp::Ordering::Greater => Trend::Improving,
            std::cmp::Ordering::Less => Trend::Declining,
            std::cmp::Ordering::Equal => Trend::Stable,
        },
        _ => Trend::Stable,
    }
}

/// Most frequent stored label; ties go to the label seen first.
fn dominant_mood(dreams: &[DreamEntry]) -> Mood {
    let mut counts: Vec<(Mood, usize)> = Vec::new();
    for mood in dreams.iter().map(DreamEntry::mood) {
        match counts.iter_mut().find(|(m, _)| *m == mood) {
            Some((_, count)) => *count += 1,
            None => counts.push((mood, 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(Mood, usize)>, (mood, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((mood, count)),
        })
        .map(|(mood, _)| mood)
        .unwrap_or_default()
}

/// Up to three words recurring across all dream texts, most frequent first.
pub fn analyze_recurring_themes(dreams: &[DreamEntry]) -> Vec<RecurringTheme> {
    if dreams.is_empty() {
        return Vec::new();
    }

    let combined = dreams
        .iter()
        .map(|d| d.dream_text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let tokens = tokenize(&combined);
    let phrases = phrases_from_tokens(&tokens, 2);

    let mut frequent: Vec<(String, usize)> = word_frequencies(&tokens)
        .into_iter()
        .filter(|(_, count)| *count >= MIN_THEME_FREQUENCY)
        .collect();
    // stable: equal counts keep first-seen order
    frequent.sort_by(|a, b| b.1.cmp(&a.1));

    frequent
        .into_iter()
        .take(MAX_RECURRING_THEMES)
        .map(|(word, frequency)| {
            let mut keywords = vec![word.clone()];
            keywords.extend(phrases_containing(&phrases, &word));
            RecurringTheme {
                theme: word,
                keywords,
                frequency,
            }
        })
        .collect()
}

/// Short natural-language summary of the history.
pub fn generate_insights(
    dreams: &[DreamEntry],
    themes: &[RecurringTheme],
    mood_trend: Option<&MoodTrend>,
) -> String {
    if dreams.is_empty() {
        return EMPTY_HISTORY_PROMPT.to_string();
    }

    let noun = if dreams.len() == 1 { "dream" } else { "dreams" };
    let mut sentences = vec![format!(
        "Based on analysis of your {} recorded {noun}",
        dreams.len()
    )];

    if let Some(trend) = mood_trend {
        sentences.push(format!(
            "Your dreams show a {} emotional pattern with {} being the dominant mood",
            trend.trend, trend.dominant_mood
        ));
    }

    if !themes.is_empty() {
        let listed = themes
            .iter()
            .map(|t| format!("\"{}\" (appearing {} times)", t.theme, t.frequency))
            .collect::<Vec<_>>()
            .join(", ");
        sentences.push(format!("Most common themes include: {listed}"));
    }

    format!("{}.", sentences.join(". "))
}

/// Everything the insights view shows for one load of the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightsReport {
    pub dream_count: usize,
    pub mood_trend: MoodTrend,
    pub themes: Vec<RecurringTheme>,
    pub summary: String,
}

pub fn build_report(dreams: &[DreamEntry]) -> InsightsReport {
    let mood_trend = analyze_mood_trends(dreams);
    let themes = analyze_recurring_themes(dreams);
    let summary = generate_insights(dreams, &themes, Some(&mood_trend));

    InsightsReport {
        dream_count: dreams.len(),
        mood_trend,
        themes,
        summary,
    }
}

impl fmt::Display for InsightsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mood Trends")?;
        writeln!(f, "  Average Mood:  {}", self.mood_trend.average_mood)?;
        writeln!(f, "  Trend:         {}", self.mood_trend.trend)?;
        writeln!(f, "  Dominant Mood: {}", self.mood_trend.dominant_mood)?;
        writeln!(f)?;

        writeln!(f, "Recurring Themes")?;
        if self.themes.is_empty() {
            writeln!(f, "  No recurring themes identified yet.")?;
        }
        for (index, theme) in self.themes.iter().enumerate() {
            let keywords: Vec<&str> = theme
                .keywords
                .iter()
                .take(DISPLAYED_KEYWORDS)
                .map(String::as_str)
                .collect();
            writeln!(f, "  Theme {}: {}", index + 1, theme.theme)?;
            writeln!(f, "    Keywords:  {}", keywords.join(", "))?;
            writeln!(f, "    Frequency: {} occurrences", theme.frequency)?;
        }
        writeln!(f)?;

        writeln!(f, "Dream Analysis Insights")?;
        write!(f, "  {}", self.summary)
    }
}

//! Aggregation
//!
//! Pure reductions from raw backend data to the values views display.

use chrono::Local;
use serde::Serialize;

use crate::client::{CountItem, CountSnapshot, RollingPoint, SentimentLabel};

/// Sum of all counts and the net sentiment score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total: u64,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    /// `(positive - negative) / total`, 0 when empty, always in [-1, 1]
    pub sentiment_score: f64,
}

impl Totals {
    /// Reduce labeled counts given in any order; missing labels count as 0
    pub fn from_items(items: &[CountItem]) -> Self {
        let total = items
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.count));
        let positive = count_of(items, SentimentLabel::Positive);
        let neutral = count_of(items, SentimentLabel::Neutral);
        let negative = count_of(items, SentimentLabel::Negative);

        Self {
            total,
            positive,
            neutral,
            negative,
            sentiment_score: score(positive, negative, total),
        }
    }
}

impl From<&CountSnapshot> for Totals {
    fn from(counts: &CountSnapshot) -> Self {
        Totals::from_items(&counts.items())
    }
}

/// A single summary card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub label: String,
    pub value: u64,
}

impl Tile {
    fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// One row of the plotted rolling series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    /// Local wall-clock time of the sample
    pub display_time: String,
    pub sentiment: f64,
}

fn count_of(items: &[CountItem], label: SentimentLabel) -> u64 {
    items
        .iter()
        .find(|i| i.label == label)
        .map(|i| i.count)
        .unwrap_or(0)
}

fn score(positive: u64, negative: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (positive as f64 - negative as f64) / total as f64
}

/// Net sentiment of a snapshot: `(positive - negative) / total`, 0 when empty
pub fn net_sentiment(counts: &CountSnapshot) -> f64 {
    let total = counts
        .positive
        .saturating_add(counts.neutral)
        .saturating_add(counts.negative);
    score(counts.positive, counts.negative, total)
}

/// Bar chart tiles, always positive, neutral, negative
pub fn bar_tiles(items: &[CountItem]) -> Vec<Tile> {
    SentimentLabel::all()
        .iter()
        .map(|&label| Tile::new(label.as_str(), count_of(items, label)))
        .collect()
}

/// Stat tiles: total, positive, neutral, negative
pub fn stat_tiles(items: &[CountItem]) -> Vec<Tile> {
    let totals = Totals::from_items(items);
    vec![
        Tile::new("total", totals.total),
        Tile::new("positive", totals.positive),
        Tile::new("neutral", totals.neutral),
        Tile::new("negative", totals.negative),
    ]
}

/// Plot rows in input order; non-finite values become 0
pub fn to_series(points: &[RollingPoint]) -> Vec<SeriesRow> {
    points
        .iter()
        .map(|p| SeriesRow {
            display_time: p
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
            sentiment: if p.value.is_finite() { p.value } else { 0.0 },
        })
        .collect()
}

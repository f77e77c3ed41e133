//! Wire and domain types for the sentiment backend
//!
//! - `CountSnapshot` / `CountItem`: label counts over a look-back window
//! - `RollingPoint`: one sample of the rolling sentiment series
//! - `Post`: a single classified social media post
//! - `Fetched`: live vs. simulated result of a client call

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sentiment class assigned to a post by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// All labels in display order
    pub fn all() -> &'static [SentimentLabel] {
        &[
            SentimentLabel::Positive,
            SentimentLabel::Neutral,
            SentimentLabel::Negative,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            _ => Err(format!("Unknown sentiment label: {}", s)),
        }
    }
}

/// Label counts for one look-back window and optional hashtag
///
/// Missing fields in the backend payload count as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountSnapshot {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub neutral: u64,
    #[serde(default)]
    pub negative: u64,
}

impl CountSnapshot {
    pub fn new(positive: u64, neutral: u64, negative: u64) -> Self {
        Self {
            positive,
            neutral,
            negative,
        }
    }

    pub fn get(&self, label: SentimentLabel) -> u64 {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        }
    }

    /// Labeled list in positive, neutral, negative order
    pub fn items(&self) -> Vec<CountItem> {
        SentimentLabel::all()
            .iter()
            .map(|&label| CountItem {
                label,
                count: self.get(label),
            })
            .collect()
    }
}

/// A single labeled count
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountItem {
    pub label: SentimentLabel,
    pub count: u64,
}

/// One sample of the rolling sentiment series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollingPoint {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RollingResponse {
    #[serde(default)]
    pub points: Vec<RollingPoint>,
}

/// A classified post, in whatever order the backend returned it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub label: Option<SentimentLabel>,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub text: String,
}

/// Unknown label strings decode as "no label" instead of failing the payload
fn lenient_label<'de, D>(deserializer: D) -> Result<Option<SentimentLabel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Result of a client call that may have been replaced by simulated data
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// Data returned by the backend
    Live(T),
    /// Backend call failed; `data` was synthesized locally
    Degraded { data: T, reason: String },
}

impl<T> Fetched<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded { .. })
    }

    pub fn data(&self) -> &T {
        match self {
            Fetched::Live(data) => data,
            Fetched::Degraded { data, .. } => data,
        }
    }

    /// Drop the live/simulated distinction
    pub fn into_inner(self) -> T {
        match self {
            Fetched::Live(data) => data,
            Fetched::Degraded { data, .. } => data,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Live(data) => Fetched::Live(f(data)),
            Fetched::Degraded { data, reason } => Fetched::Degraded {
                data: f(data),
                reason,
            },
        }
    }
}

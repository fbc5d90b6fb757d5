use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Institutional perception analysis of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAnalysis {
    /// One word: Positivo, Negativo or Neutral (whatever the model answered).
    pub sentiment: String,
    pub key_themes: Vec<String>,
    pub executive_summary: String,
}

/// A generated headline with its (fictional) source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeopoliticalAnalysis {
    pub summary: String,
    pub key_points: Vec<String>,
    /// Bajo, Medio or Alto.
    pub risk_assessment: String,
}

/// One message of a (simulated or relayed) Telegram channel feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub author: String,
    pub text: String,
    /// Relative, human-readable ("hace 5 minutos").
    pub timestamp: String,
}

/// A real news article as shown in the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub summary: String,
    /// Source name, e.g. "El Universal".
    pub source: String,
    pub url: String,
    /// RFC 3339 timestamp as reported upstream.
    pub published_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Positive,
    Negative,
    Neutral,
}

/// A dashboard metric card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub title: String,
    pub value: String,
    pub change: String,
    pub change_type: ChangeType,
}

/// A tracked asset and the topic used to look up news about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub name: String,
    pub value: String,
    pub change: String,
    pub change_type: ChangeType,
    pub news_topic: String,
}

/// One day of the economic activity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Smoothed trend; `None` until the window is full.
    pub trend: Option<f64>,
}

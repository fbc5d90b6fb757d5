use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The enumerated prompt intents a page can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntentKind {
    /// Institutional perception analysis of a topic.
    AnalyzeTopic,
    /// Plausible recent headlines about a topic.
    GenerateHeadlines,
    /// Free-text communication draft (press release, social post...).
    GenerateContent,
    /// Geopolitical reading of a news item, focused on Venezuela.
    GetGeopoliticalAnalysis,
    /// Simulated messages from a set of Telegram channels.
    SimulateChannelFeed,
    /// Simulated transcript of a short central-bank audio clip.
    SimulateTranscript,
}

impl IntentKind {
    pub const ALL: [IntentKind; 6] = [
        IntentKind::AnalyzeTopic,
        IntentKind::GenerateHeadlines,
        IntentKind::GenerateContent,
        IntentKind::GetGeopoliticalAnalysis,
        IntentKind::SimulateChannelFeed,
        IntentKind::SimulateTranscript,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::AnalyzeTopic => "AnalyzeTopic",
            IntentKind::GenerateHeadlines => "GenerateHeadlines",
            IntentKind::GenerateContent => "GenerateContent",
            IntentKind::GetGeopoliticalAnalysis => "GetGeopoliticalAnalysis",
            IntentKind::SimulateChannelFeed => "SimulateChannelFeed",
            IntentKind::SimulateTranscript => "SimulateTranscript",
        }
    }

    /// Placeholder names the intent's template requires, in order of first use.
    pub fn required_params(&self) -> Vec<&'static str> {
        super::templates::placeholders(super::templates::template_for(*self))
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An intent plus the named parameters that fill its template.
///
/// Parameters are kept in a `BTreeMap` so equal intents compare, hash and
/// render identically regardless of insertion order. There are no setters:
/// `with_param` consumes the value, so an intent handed to the builder cannot
/// change underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptIntent {
    kind: IntentKind,
    params: BTreeMap<String, String>,
}

impl PromptIntent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    // --- Convenience constructors, one per intent ---

    pub fn analyze_topic(topic: impl Into<String>) -> Self {
        Self::new(IntentKind::AnalyzeTopic).with_param("topic", topic)
    }

    pub fn generate_headlines(topic: impl Into<String>) -> Self {
        Self::new(IntentKind::GenerateHeadlines).with_param("topic", topic)
    }

    pub fn generate_content(topic: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::new(IntentKind::GenerateContent)
            .with_param("topic", topic)
            .with_param("content_type", content_type)
    }

    pub fn geopolitical_analysis(news_summary: impl Into<String>) -> Self {
        Self::new(IntentKind::GetGeopoliticalAnalysis).with_param("news_summary", news_summary)
    }

    pub fn simulate_channel_feed(channels: impl Into<String>) -> Self {
        Self::new(IntentKind::SimulateChannelFeed).with_param("channels", channels)
    }

    pub fn simulate_transcript() -> Self {
        Self::new(IntentKind::SimulateTranscript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_order_does_not_matter() {
        let a = PromptIntent::new(IntentKind::GenerateContent)
            .with_param("topic", "reservas")
            .with_param("content_type", "Nota de Prensa");
        let b = PromptIntent::new(IntentKind::GenerateContent)
            .with_param("content_type", "Nota de Prensa")
            .with_param("topic", "reservas");
        assert_eq!(a, b);
    }

    #[test]
    fn test_required_params_per_intent() {
        assert_eq!(IntentKind::AnalyzeTopic.required_params(), vec!["topic"]);
        assert_eq!(
            IntentKind::GenerateContent.required_params(),
            vec!["topic", "content_type"]
        );
        assert_eq!(
            IntentKind::GetGeopoliticalAnalysis.required_params(),
            vec!["news_summary"]
        );
        assert_eq!(IntentKind::SimulateChannelFeed.required_params(), vec!["channels"]);
        assert!(IntentKind::SimulateTranscript.required_params().is_empty());
    }

    #[test]
    fn test_later_param_overrides_earlier() {
        let intent = PromptIntent::analyze_topic("uno").with_param("topic", "dos");
        assert_eq!(intent.param("topic"), Some("dos"));
        assert_eq!(intent.params().len(), 1);
    }
}

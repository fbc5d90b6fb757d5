use crate::error::{MediosError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw";
pub const DEFAULT_DASHBOARD_QUERY: &str = "economía venezolana AND (BCV OR \"dólar\")";
pub const DEFAULT_CHANNELS: [&str; 2] = ["@bcv_org_ve", "@economia_digital"];
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Generative oracle settings.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Required. Never logged; `Debug` prints it redacted.
    pub api_key: Option<SecretString>,
    /// Default: "gemini-2.5-flash"
    pub model: String,
    pub base_url: String,
    /// Upper bound for one generate call. Default: 30 seconds.
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OracleConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// News aggregator settings.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// Required. Sent as the `apiKey` query parameter of the upstream URL.
    pub api_key: Option<SecretString>,
    pub api_url: String,
    /// Relay the upstream URL is wrapped in. `None` calls the aggregator directly.
    pub relay_url: Option<String>,
    /// Default: "es"
    pub language: String,
    /// Default: "publishedAt"
    pub sort_by: String,
    /// Default: 10
    pub page_size: u32,
    pub timeout: Duration,
    /// Query used by the dashboard's live feed.
    pub dashboard_query: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_NEWS_API_URL.into(),
            relay_url: Some(DEFAULT_RELAY_URL.into()),
            language: "es".into(),
            sort_by: "publishedAt".into(),
            page_size: 10,
            timeout: DEFAULT_TIMEOUT,
            dashboard_query: DEFAULT_DASHBOARD_QUERY.into(),
        }
    }
}

impl NewsConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_relay(mut self, relay_url: Option<String>) -> Self {
        self.relay_url = relay_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Where a capability's data comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Simulated,
    Remote {
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub channel_feed: SourceMode,
    pub metrics: SourceMode,
}

/// Everything needed to assemble a [`crate::MediaAssistant`].
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub oracle: OracleConfig,
    pub news: NewsConfig,
    pub sources: SourcesConfig,
    /// Channels monitored when a caller does not name any.
    pub default_channels: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            news: NewsConfig::default(),
            sources: SourcesConfig::default(),
            default_channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn key_missing(key: &Option<SecretString>) -> bool {
    key.as_ref()
        .map(|k| k.expose_secret().trim().is_empty())
        .unwrap_or(true)
}

impl AssistantConfig {
    /// Every problem with this config, so startup can report them all at once.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if key_missing(&self.oracle.api_key) {
            errors.push("oracle API key is not set (GEMINI_API_KEY)".to_string());
        }
        if self.oracle.model.trim().is_empty() {
            errors.push("oracle model must not be empty".to_string());
        }
        if !is_http_url(&self.oracle.base_url) {
            errors.push(format!("oracle base URL is not http(s): {}", self.oracle.base_url));
        }
        if self.oracle.timeout.is_zero() {
            errors.push("oracle timeout must be > 0".to_string());
        }

        if key_missing(&self.news.api_key) {
            errors.push("news API key is not set (NEWS_API_KEY)".to_string());
        }
        if !is_http_url(&self.news.api_url) {
            errors.push(format!("news API URL is not http(s): {}", self.news.api_url));
        }
        if let Some(relay) = &self.news.relay_url {
            if !is_http_url(relay) {
                errors.push(format!("news relay URL is not http(s): {}", relay));
            }
        }
        if !(1..=100).contains(&self.news.page_size) {
            errors.push(format!(
                "news page size must be within 1..=100, got {}",
                self.news.page_size
            ));
        }
        if self.news.timeout.is_zero() {
            errors.push("news timeout must be > 0".to_string());
        }

        if !self.default_channels.iter().any(|c| !c.trim().is_empty()) {
            errors.push("default channel list must name at least one channel".to_string());
        }

        for (name, mode) in [
            ("channel_feed", &self.sources.channel_feed),
            ("metrics", &self.sources.metrics),
        ] {
            if let SourceMode::Remote { url } = mode {
                if !is_http_url(url) {
                    errors.push(format!("remote {} source URL is not http(s): {}", name, url));
                }
            }
        }

        errors
    }

    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MediosError::Config(errors.join("; ")))
        }
    }
}

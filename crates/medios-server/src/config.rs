use anyhow::Context;
use clap::Parser;
use medios_core::config::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_NEWS_API_URL, DEFAULT_RELAY_URL,
};
use medios_core::{
    AssistantConfig, NewsConfig, OracleConfig, SourcesConfig, DEFAULT_SLOT_CAPACITY,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug, Clone)]
#[command(name = "medios")]
#[command(version, about = "Media-monitoring assistant backend")]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "MEDIOS_HTTP_ADDR", default_value = "0.0.0.0:9095")]
    pub http_addr: SocketAddr,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<SecretString>,

    /// Gemini model
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// News aggregator API key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<SecretString>,

    #[arg(long, env = "NEWS_API_URL", default_value = DEFAULT_NEWS_API_URL)]
    pub news_api_url: String,

    /// Relay wrapping news requests. Empty calls the aggregator directly.
    #[arg(long, env = "NEWS_RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    pub news_relay_url: String,

    /// Timeout for every outbound call, in seconds
    #[arg(long, env = "MEDIOS_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Operation slots kept before the least recently used are forgotten
    #[arg(long, env = "MEDIOS_MAX_SLOTS", default_value_t = DEFAULT_SLOT_CAPACITY)]
    pub max_slots: usize,

    /// Path to medios.toml
    #[arg(long, env = "MEDIOS_CONFIG", default_value = "medios.toml")]
    pub config: PathBuf,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Flags and environment layered over the settings file.
    pub fn assistant_config(&self, settings: &Settings) -> AssistantConfig {
        let mut oracle = OracleConfig::default()
            .with_model(self.gemini_model.clone())
            .with_base_url(self.gemini_base_url.clone())
            .with_timeout(self.timeout());
        oracle.api_key = self.gemini_api_key.clone();

        let relay = Some(self.news_relay_url.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        let mut news = NewsConfig::default()
            .with_relay(relay)
            .with_timeout(self.timeout());
        news.api_key = self.news_api_key.clone();
        news.api_url = self.news_api_url.clone();
        settings.news.apply(&mut news);

        let mut config = AssistantConfig {
            oracle,
            news,
            sources: settings.sources.clone(),
            ..Default::default()
        };
        if let Some(channels) = &settings.channels.default {
            config.default_channels = channels.clone();
        }
        config
    }

    /// Load the settings file, merge, and fail with every problem found.
    pub fn load_assistant_config(&self) -> anyhow::Result<AssistantConfig> {
        let settings = Settings::load(&self.config)?;
        let config = self.assistant_config(&settings);

        let errors = config.validate();
        if !errors.is_empty() {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "));
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 9095)),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            news_api_key: None,
            news_api_url: DEFAULT_NEWS_API_URL.to_string(),
            news_relay_url: DEFAULT_RELAY_URL.to_string(),
            timeout_secs: 30,
            max_slots: DEFAULT_SLOT_CAPACITY,
            config: PathBuf::from("medios.toml"),
        }
    }
}

/// Optional `medios.toml`.
///
/// ```toml
/// [news]
/// page_size = 20
/// dashboard_query = "BCV"
///
/// [channels]
/// default = ["@bcv_org_ve"]
///
/// [sources.metrics]
/// mode = "remote"
/// url = "http://feeds.internal"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub news: NewsSettings,
    pub channels: ChannelSettings,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub language: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<u32>,
    pub dashboard_query: Option<String>,
}

impl NewsSettings {
    fn apply(&self, news: &mut NewsConfig) {
        if let Some(language) = &self.language {
            news.language = language.clone();
        }
        if let Some(sort_by) = &self.sort_by {
            news.sort_by = sort_by.clone();
        }
        if let Some(page_size) = self.page_size {
            news.page_size = page_size;
        }
        if let Some(query) = &self.dashboard_query {
            news.dashboard_query = query.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub default: Option<Vec<String>>,
}

impl Settings {
    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }
}

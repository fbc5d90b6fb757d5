use crate::activity::simulated_activity_series;
use crate::config::{AssistantConfig, SourceMode};
use crate::error::{BuildError, QueryError, Result};
use crate::news::NewsClient;
use crate::oracle::{GeminiOracle, Oracle};
use crate::prompt::{build, PromptIntent};
use crate::query::{PendingQuery, QueryExecutor, QueryResult};
use crate::sources::{
    ChannelFeedSource, ChannelList, MetricsSource, OracleChannelFeed, OracleTranscription,
    RemoteJsonSource, StaticMetrics, TranscriptionSource, GEOPOLITICAL_SAMPLES,
};
use crate::types::{
    ActivityPoint, Asset, ChannelMessage, GeopoliticalAnalysis, Headline, Metric, NewsArticle,
    TopicAnalysis,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Every operation the dashboard pages call.
///
/// Operations that render caller input into a prompt validate it up front
/// and hand back a [`PendingQuery`]; nothing is sent until it is awaited.
/// Everything remote resolves to a [`QueryResult`].
///
/// # Example
/// ```rust,no_run
/// use medios_core::{AssistantConfig, MediaAssistant, NewsConfig, OracleConfig};
///
/// # async fn demo() -> medios_core::Result<()> {
/// let config = AssistantConfig {
///     oracle: OracleConfig::default().with_api_key("gemini-key"),
///     news: NewsConfig::default().with_api_key("news-key"),
///     ..Default::default()
/// };
/// let assistant = MediaAssistant::from_config(&config)?;
/// let analysis = assistant.analyze_topic("Banco Central de Venezuela")?.send().await;
/// # Ok(())
/// # }
/// ```
pub struct MediaAssistant {
    executor: QueryExecutor,
    news: NewsClient,
    channel_feed: Arc<dyn ChannelFeedSource>,
    transcription: Arc<dyn TranscriptionSource>,
    metrics: Arc<dyn MetricsSource>,
    default_channels: ChannelList,
}

impl MediaAssistant {
    /// Oracle-backed channel feed and transcription, static metrics and
    /// the stock default channels.
    pub fn new(executor: QueryExecutor, news: NewsClient) -> Self {
        Self {
            channel_feed: Arc::new(OracleChannelFeed::new(executor.clone())),
            transcription: Arc::new(OracleTranscription::new(executor.clone())),
            metrics: Arc::new(StaticMetrics::default()),
            default_channels: ChannelList::default(),
            executor,
            news,
        }
    }

    /// Validates `config` and wires the Gemini oracle, the HTTP news client
    /// and the configured sources.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        config.ensure_valid()?;

        let oracle: Arc<dyn Oracle> = Arc::new(GeminiOracle::new(config.oracle.clone())?);
        let executor = QueryExecutor::new(oracle).with_timeout(config.oracle.timeout);
        let news = NewsClient::from_config(config.news.clone())?;
        let mut assistant = Self::new(executor, news)
            .with_default_channels(ChannelList::new(&config.default_channels)?);

        if let SourceMode::Remote { url } = &config.sources.channel_feed {
            log::info!("Channel feed source: {}", url);
            assistant = assistant.with_channel_feed(Arc::new(RemoteJsonSource::from_url(
                url.clone(),
                config.news.timeout,
            )?));
        }
        if let SourceMode::Remote { url } = &config.sources.metrics {
            log::info!("Metrics source: {}", url);
            assistant = assistant.with_metrics(Arc::new(RemoteJsonSource::from_url(
                url.clone(),
                config.news.timeout,
            )?));
        }

        Ok(assistant)
    }

    pub fn with_channel_feed(mut self, source: Arc<dyn ChannelFeedSource>) -> Self {
        self.channel_feed = source;
        self
    }

    pub fn with_transcription(mut self, source: Arc<dyn TranscriptionSource>) -> Self {
        self.transcription = source;
        self
    }

    pub fn with_metrics(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.metrics = source;
        self
    }

    pub fn with_default_channels(mut self, channels: ChannelList) -> Self {
        self.default_channels = channels;
        self
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn news(&self) -> &NewsClient {
        &self.news
    }

    pub fn default_channels(&self) -> &ChannelList {
        &self.default_channels
    }

    // --- Prompted operations ---

    pub fn analyze_topic(
        &self,
        topic: &str,
    ) -> std::result::Result<PendingQuery<TopicAnalysis>, BuildError> {
        self.pending(PromptIntent::analyze_topic(topic))
    }

    pub fn generate_headlines(
        &self,
        topic: &str,
    ) -> std::result::Result<PendingQuery<Vec<Headline>>, BuildError> {
        self.pending(PromptIntent::generate_headlines(topic))
    }

    /// Free-text draft. `content_type` is e.g. "Nota de Prensa" or "Post para Redes Sociales".
    pub fn generate_content_draft(
        &self,
        topic: &str,
        content_type: &str,
    ) -> std::result::Result<PendingQuery<String>, BuildError> {
        self.pending(PromptIntent::generate_content(topic, content_type))
    }

    pub fn get_geopolitical_analysis(
        &self,
        news_summary: &str,
    ) -> std::result::Result<PendingQuery<GeopoliticalAnalysis>, BuildError> {
        self.pending(PromptIntent::geopolitical_analysis(news_summary))
    }

    fn pending<T: DeserializeOwned>(
        &self,
        intent: PromptIntent,
    ) -> std::result::Result<PendingQuery<T>, BuildError> {
        let request = build(intent)?;
        Ok(PendingQuery::new(self.executor.clone(), request))
    }

    // --- Capability sources ---

    pub async fn simulate_channel_feed(
        &self,
        channels: &ChannelList,
    ) -> QueryResult<Vec<ChannelMessage>> {
        self.channel_feed.feed(channels).await
    }

    pub async fn simulate_transcript(&self) -> QueryResult<String> {
        self.transcription.transcribe().await
    }

    pub async fn dashboard_metrics(&self) -> QueryResult<Vec<Metric>> {
        self.metrics.metrics().await
    }

    pub async fn assets(&self) -> QueryResult<Vec<Asset>> {
        self.metrics.assets().await
    }

    // --- News ---

    /// Always `Success`; failures and empty results arrive as sentinel records.
    pub async fn fetch_real_news(&self, query: &str) -> QueryResult<Vec<NewsArticle>> {
        self.news.fetch_real_news(query).await
    }

    pub async fn search_news(
        &self,
        query: &str,
    ) -> std::result::Result<Vec<NewsArticle>, QueryError> {
        self.news.search(query).await
    }

    // --- Local ---

    /// Preset news items to feed [`Self::get_geopolitical_analysis`].
    pub fn geopolitical_samples(&self) -> &'static [&'static str] {
        &GEOPOLITICAL_SAMPLES
    }

    /// `days` points ending today (UTC).
    pub fn economic_activity(&self, days: usize, seed: u64) -> Vec<ActivityPoint> {
        simulated_activity_series(days, seed, Utc::now().date_naive())
    }
}

use super::sentinel::{self, NO_SUMMARY};
use crate::config::NewsConfig;
use crate::error::{QueryError, QueryErrorKind, Result, UpstreamError};
use crate::query::classify::{classify, NEWS_UPSTREAM};
use crate::query::QueryResult;
use crate::transport::{HttpTransport, RelayTransport, Transport};
use crate::types::NewsArticle;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;

const REMOVED_MARKER: &str = "[Removed]";
const UNKNOWN_SOURCE: &str = "Fuente desconocida";

/// News aggregator client (NewsAPI `/v2/everything` wire format).
pub struct NewsClient {
    transport: Arc<dyn Transport>,
    config: NewsConfig,
}

impl NewsClient {
    pub fn new(transport: Arc<dyn Transport>, config: NewsConfig) -> Self {
        Self { transport, config }
    }

    /// HTTP transport, wrapped in the configured relay if any.
    pub fn from_config(config: NewsConfig) -> Result<Self> {
        let http = HttpTransport::new(config.timeout)?;
        let transport: Arc<dyn Transport> = match &config.relay_url {
            Some(relay) => Arc::new(RelayTransport::new(http, relay.clone())),
            None => Arc::new(http),
        };
        Ok(Self::new(transport, config))
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    /// Upstream URL for `query`. Contains the API key; never log it.
    pub fn search_url(&self, query: &str) -> Option<String> {
        let key = self.config.api_key.as_ref()?;
        Some(format!(
            "{}?q={}&language={}&sortBy={}&pageSize={}&apiKey={}",
            self.config.api_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.config.language),
            urlencoding::encode(&self.config.sort_by),
            self.config.page_size,
            urlencoding::encode(key.expose_secret()),
        ))
    }

    /// Typed search. A blank query falls back to the dashboard query.
    pub async fn search(&self, query: &str) -> std::result::Result<Vec<NewsArticle>, QueryError> {
        let query = self.effective_query(query);
        let url = self.search_url(query).ok_or_else(|| {
            QueryError::new(
                QueryErrorKind::AuthError,
                "La clave de la API de noticias no está configurada.",
            )
        })?;

        log::debug!("Searching news for {:?}", query);

        let call = self.transport.get(&url);
        let response = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(self.fail(&err)),
            Err(_) => return Err(self.fail(&UpstreamError::Timeout(self.config.timeout))),
        };

        if !response.is_success() {
            return Err(self.fail(&UpstreamError::Status {
                status: response.status,
                body: response.body,
            }));
        }

        let parsed: SearchResponse = serde_json::from_str(&response.body)
            .map_err(|e| self.fail(&UpstreamError::MalformedBody(e.to_string())))?;

        // Relays may forward an upstream error with a 2xx status.
        if parsed.status.as_deref() == Some("error") {
            return Err(self.fail(&UpstreamError::Status {
                status: response.status,
                body: response.body,
            }));
        }

        let articles: Vec<NewsArticle> = parsed
            .articles
            .into_iter()
            .filter_map(WireArticle::into_article)
            .collect();
        log::debug!("News search returned {} articles", articles.len());
        Ok(articles)
    }

    /// Sentinel path: always `Success`, with a single explanatory record in
    /// place of articles when there are none or the search failed.
    pub async fn fetch_real_news(&self, query: &str) -> QueryResult<Vec<NewsArticle>> {
        if self.config.api_key.is_none() {
            log::warn!("News API key not configured");
            return QueryResult::Success(vec![sentinel::missing_key()]);
        }

        let query = self.effective_query(query);
        let articles = match self.search(query).await {
            Ok(articles) if articles.is_empty() => vec![sentinel::no_results(query)],
            Ok(articles) => articles,
            Err(err) => vec![sentinel::from_error(&err)],
        };
        QueryResult::Success(articles)
    }

    fn effective_query<'a>(&'a self, query: &'a str) -> &'a str {
        if query.trim().is_empty() {
            &self.config.dashboard_query
        } else {
            query
        }
    }

    fn fail(&self, err: &UpstreamError) -> QueryError {
        let error = classify(err, &NEWS_UPSTREAM);
        log::warn!("News search failed ({}): {}", error.kind, error.message);
        error
    }
}

// --- Wire format ---

#[derive(Deserialize)]
struct SearchResponse {
    status: Option<String>,
    #[serde(default)]
    articles: Vec<WireArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireArticle {
    source: Option<WireSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct WireSource {
    name: Option<String>,
}

impl WireArticle {
    fn into_article(self) -> Option<NewsArticle> {
        let title = self.title.map(|t| t.trim().to_string())?;
        if title.is_empty() || title == REMOVED_MARKER {
            return None;
        }

        let summary = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_SUMMARY.to_string());
        let source = self
            .source
            .and_then(|s| s.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        Some(NewsArticle {
            title,
            summary,
            source,
            url: self.url.unwrap_or_default(),
            published_at: self.published_at.unwrap_or_default(),
        })
    }
}

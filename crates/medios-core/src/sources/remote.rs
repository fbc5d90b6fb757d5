use super::{ChannelFeedSource, ChannelList, MetricsSource};
use crate::error::{Result, UpstreamError};
use crate::query::classify::{classify, FEED_UPSTREAM};
use crate::query::QueryResult;
use crate::transport::{HttpTransport, Transport};
use crate::types::{Asset, ChannelMessage, Metric};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Reads dashboard data from an HTTP JSON service.
///
/// Endpoints, relative to the base URL: `GET /metrics`, `GET /assets` and
/// `GET /feed?channels=a,b`. Each returns a JSON array.
pub struct RemoteJsonSource {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl RemoteJsonSource {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(timeout)?);
        Ok(Self::new(transport, base_url, timeout))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> QueryResult<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("Fetching {}", url);

        let outcome = match tokio::time::timeout(self.timeout, self.transport.get(&url)).await {
            Ok(Ok(response)) if response.is_success() => serde_json::from_str(&response.body)
                .map_err(|e| UpstreamError::MalformedBody(e.to_string())),
            Ok(Ok(response)) => Err(UpstreamError::Status {
                status: response.status,
                body: response.body,
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(value) => QueryResult::Success(value),
            Err(err) => {
                let error = classify(&err, &FEED_UPSTREAM);
                log::warn!("{} failed ({}): {}", url, error.kind, err);
                QueryResult::Failure(error)
            }
        }
    }
}

#[async_trait]
impl ChannelFeedSource for RemoteJsonSource {
    async fn feed(&self, channels: &ChannelList) -> QueryResult<Vec<ChannelMessage>> {
        let joined = channels.channels().join(",");
        self.get_json(&format!("/feed?channels={}", urlencoding::encode(&joined)))
            .await
    }
}

#[async_trait]
impl MetricsSource for RemoteJsonSource {
    async fn metrics(&self) -> QueryResult<Vec<Metric>> {
        self.get_json("/metrics").await
    }

    async fn assets(&self) -> QueryResult<Vec<Asset>> {
        self.get_json("/assets").await
    }
}

use crate::error::{Result, UpstreamError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Status and body of an upstream answer, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Plain HTTP GET. Non-2xx answers are returned, not raised; only failures
/// to get an answer at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<RawResponse, UpstreamError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &str) -> std::result::Result<RawResponse, UpstreamError> {
        (**self).get(url).await
    }
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> std::result::Result<RawResponse, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;
        Ok(RawResponse { status, body })
    }
}

/// Wraps every target URL in a pass-through relay (`{relay}?url={target}`),
/// for upstreams that refuse browser-origin requests.
pub struct RelayTransport<T> {
    inner: T,
    relay_url: String,
}

impl<T: Transport> RelayTransport<T> {
    pub fn new(inner: T, relay_url: impl Into<String>) -> Self {
        Self {
            inner,
            relay_url: relay_url.into(),
        }
    }

    pub fn relayed(&self, target: &str) -> String {
        format!("{}?url={}", self.relay_url, urlencoding::encode(target))
    }
}

#[async_trait]
impl<T: Transport> Transport for RelayTransport<T> {
    async fn get(&self, url: &str) -> std::result::Result<RawResponse, UpstreamError> {
        self.inner.get(&self.relayed(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl Transport for Recorder {
        async fn get(&self, url: &str) -> std::result::Result<RawResponse, UpstreamError> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(RawResponse {
                status: 200,
                body: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_relay_encodes_target() {
        let relay = RelayTransport::new(
            Recorder(Mutex::new(Vec::new())),
            "https://api.allorigins.win/raw",
        );
        relay
            .get("https://newsapi.org/v2/everything?q=BCV&language=es")
            .await
            .unwrap();

        let seen = relay.inner.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec!["https://api.allorigins.win/raw?url=https%3A%2F%2Fnewsapi.org%2Fv2%2Feverything%3Fq%3DBCV%26language%3Des"]
        );
    }

    #[test]
    fn test_success_range() {
        let ok = RawResponse {
            status: 204,
            body: String::new(),
        };
        let bad = RawResponse {
            status: 401,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}

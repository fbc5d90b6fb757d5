use crate::prompt::IntentKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MediosError>;

/// Construction-time failures. Remote failures never surface here; they are
/// folded into [`QueryError`] at the executor boundary.
#[derive(Debug, Error)]
pub enum MediosError {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A malformed intent or parameter set. Local only: a request that fails to
/// build is never sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("intent {intent} requires parameter '{param}'")]
    MissingParam { intent: IntentKind, param: String },

    #[error("parameter '{param}' for intent {intent} is blank")]
    BlankParam { intent: IntentKind, param: String },

    #[error("malformed template for intent {intent}: {reason}")]
    Template { intent: IntentKind, reason: String },
}

/// Failure reported by an upstream service before any classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("upstream returned no content: {0}")]
    NoContent(String),
}

impl UpstreamError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else if err.is_decode() {
            UpstreamError::MalformedBody(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryErrorKind {
    NetworkError,
    AuthError,
    RateLimited,
    ParseError,
    EmptyResult,
    Unknown,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryErrorKind::NetworkError => "network_error",
            QueryErrorKind::AuthError => "auth_error",
            QueryErrorKind::RateLimited => "rate_limited",
            QueryErrorKind::ParseError => "parse_error",
            QueryErrorKind::EmptyResult => "empty_result",
            QueryErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The tagged error carried by a failed query.
///
/// `message` is meant for display as-is. `status` is the upstream HTTP status
/// when the upstream answered at all; transport failures and timeouts leave
/// it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::NetworkError, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::ParseError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::Unknown, message)
    }

    pub fn is_transport(&self) -> bool {
        self.kind == QueryErrorKind::NetworkError && self.status.is_none()
    }
}

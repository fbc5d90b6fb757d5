use super::classify::{classify, ORACLE_UPSTREAM};
use super::state::QueryResult;
use crate::config::DEFAULT_TIMEOUT;
use crate::error::{QueryError, UpstreamError};
use crate::oracle::Oracle;
use crate::prompt::QueryRequest;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// What a successful call produced: trimmed free text, or JSON already
/// validated against the request's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    pub fn into_value(self) -> Value {
        match self {
            Payload::Text(text) => Value::String(text),
            Payload::Json(value) => value,
        }
    }
}

/// Sends built requests to the oracle and folds every outcome into a
/// terminal [`QueryResult`]. Never panics or returns a transport error to
/// the caller.
#[derive(Clone)]
pub struct QueryExecutor {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    pub async fn execute(&self, request: &QueryRequest) -> QueryResult<Payload> {
        log::debug!(
            "Dispatching {} to {} ({} chars)",
            request.kind(),
            self.oracle.name(),
            request.prompt().len()
        );

        let call = self.oracle.generate(request.prompt(), request.shape());
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => return self.fail(request, &err),
            Err(_) => return self.fail(request, &UpstreamError::Timeout(self.timeout)),
        };

        match request.shape() {
            None => QueryResult::Success(Payload::Text(raw.trim().to_string())),
            Some(shape) => match shape.parse(&raw) {
                Ok(value) => QueryResult::Success(Payload::Json(value)),
                Err(e) => self.fail(request, &UpstreamError::MalformedBody(e.to_string())),
            },
        }
    }

    /// [`execute`](Self::execute), then deserialize into `T`. A validated
    /// payload that still does not fit `T` is an `Unknown` failure.
    pub async fn execute_as<T: DeserializeOwned>(&self, request: &QueryRequest) -> QueryResult<T> {
        let kind = request.kind();
        self.execute(request).await.and_then(|payload| {
            match serde_json::from_value(payload.into_value()) {
                Ok(value) => QueryResult::Success(value),
                Err(e) => {
                    log::warn!("{} payload did not deserialize: {}", kind, e);
                    QueryResult::Failure(QueryError::unknown(format!(
                        "Respuesta inesperada para {}: {}",
                        kind, e
                    )))
                }
            }
        })
    }

    fn fail<T>(&self, request: &QueryRequest, err: &UpstreamError) -> QueryResult<T> {
        let error = classify(err, &ORACLE_UPSTREAM);
        log::warn!(
            "{} via {} failed ({}): {}",
            request.kind(),
            self.oracle.name(),
            error.kind,
            err
        );
        QueryResult::Failure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;
    use crate::prompt::{build, PromptIntent};
    use crate::shape::ResponseShape;
    use crate::types::TopicAnalysis;
    use async_trait::async_trait;

    enum Reply {
        Text(&'static str),
        Err(UpstreamError),
        Hang,
    }

    struct Scripted(Reply);

    #[async_trait]
    impl Oracle for Scripted {
        async fn generate(
            &self,
            _prompt: &str,
            _shape: Option<&ResponseShape>,
        ) -> Result<String, UpstreamError> {
            match &self.0 {
                Reply::Text(t) => Ok(t.to_string()),
                Reply::Err(e) => Err(e.clone()),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(String::new())
                }
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn executor(reply: Reply) -> QueryExecutor {
        QueryExecutor::new(Arc::new(Scripted(reply)))
    }

    fn analysis_request() -> QueryRequest {
        build(PromptIntent::analyze_topic("tasa de cambio")).unwrap()
    }

    #[tokio::test]
    async fn test_structured_success() {
        let exec = executor(Reply::Text(
            r#"{"sentiment":"Positivo","keyThemes":["reservas","inflación"],"executiveSummary":"Estable."}"#,
        ));
        let result: QueryResult<TopicAnalysis> = exec.execute_as(&analysis_request()).await;
        let analysis = result.into_success().unwrap();
        assert_eq!(analysis.sentiment, "Positivo");
        assert_eq!(analysis.key_themes, vec!["reservas", "inflación"]);
    }

    #[tokio::test]
    async fn test_free_text_is_trimmed() {
        let exec = executor(Reply::Text("\n  Borrador de nota.  \n"));
        let request = build(PromptIntent::generate_content("BCV", "Nota de Prensa")).unwrap();
        let result: QueryResult<String> = exec.execute_as(&request).await;
        assert_eq!(result, QueryResult::Success("Borrador de nota.".into()));
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_parse_error() {
        let exec = executor(Reply::Text(r#"{"sentiment":"Positivo"}"#));
        let result = exec.execute(&analysis_request()).await;
        assert_eq!(result.failure().map(|e| e.kind), Some(QueryErrorKind::ParseError));

        let exec = executor(Reply::Text("esto no es JSON"));
        let result = exec.execute(&analysis_request()).await;
        assert_eq!(result.failure().map(|e| e.kind), Some(QueryErrorKind::ParseError));
    }

    #[tokio::test]
    async fn test_upstream_errors_are_classified() {
        let exec = executor(Reply::Err(UpstreamError::Status {
            status: 429,
            body: r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#.into(),
        }));
        let err = exec.execute(&analysis_request()).await.failure().cloned().unwrap();
        assert_eq!(err.kind, QueryErrorKind::RateLimited);
        assert_eq!(err.status, Some(429));

        let exec = executor(Reply::Err(UpstreamError::NoContent("no candidates".into())));
        let result = exec.execute(&analysis_request()).await;
        assert_eq!(result.failure().map(|e| e.kind), Some(QueryErrorKind::EmptyResult));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let exec = executor(Reply::Hang).with_timeout(Duration::from_millis(20));
        let err = exec.execute(&analysis_request()).await.failure().cloned().unwrap();
        assert_eq!(err.kind, QueryErrorKind::NetworkError);
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_type_mismatch_after_validation_is_unknown() {
        // Validated as an analysis object, asked for as a list.
        let exec = executor(Reply::Text(
            r#"{"sentiment":"Neutral","keyThemes":[],"executiveSummary":"-"}"#,
        ));
        let result: QueryResult<Vec<u32>> = exec.execute_as(&analysis_request()).await;
        assert_eq!(result.failure().map(|e| e.kind), Some(QueryErrorKind::Unknown));
    }
}

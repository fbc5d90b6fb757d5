use crate::error::QueryError;
use serde::{Deserialize, Serialize};

/// Three-state (plus idle) view of one asynchronous operation.
///
/// Serialized as `{"state": "success", "data": ...}` so a page can switch on
/// `state` without inspecting the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum QueryResult<T> {
    Idle,
    Loading,
    Success(T),
    Failure(QueryError),
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        QueryResult::Idle
    }
}

impl<T> QueryResult<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, QueryResult::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryResult::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, QueryResult::Failure(_))
    }

    /// `Success` or `Failure`.
    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            QueryResult::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&QueryError> {
        match self {
            QueryResult::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            QueryResult::Success(v) => Some(v),
            _ => None,
        }
    }

    /// `None` while idle or loading.
    pub fn into_result(self) -> Option<Result<T, QueryError>> {
        match self {
            QueryResult::Success(v) => Some(Ok(v)),
            QueryResult::Failure(e) => Some(Err(e)),
            QueryResult::Idle | QueryResult::Loading => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        match self {
            QueryResult::Idle => QueryResult::Idle,
            QueryResult::Loading => QueryResult::Loading,
            QueryResult::Success(v) => QueryResult::Success(f(v)),
            QueryResult::Failure(e) => QueryResult::Failure(e),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> QueryResult<U>) -> QueryResult<U> {
        match self {
            QueryResult::Idle => QueryResult::Idle,
            QueryResult::Loading => QueryResult::Loading,
            QueryResult::Success(v) => f(v),
            QueryResult::Failure(e) => QueryResult::Failure(e),
        }
    }
}

impl<T> From<Result<T, QueryError>> for QueryResult<T> {
    fn from(result: Result<T, QueryError>) -> Self {
        match result {
            Ok(v) => QueryResult::Success(v),
            Err(e) => QueryResult::Failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;
    use serde_json::json;

    #[test]
    fn test_serialized_form() {
        let ok: QueryResult<Vec<String>> = QueryResult::Success(vec![]);
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"state": "success", "data": []}));

        let loading: QueryResult<u8> = QueryResult::Loading;
        assert_eq!(serde_json::to_value(&loading).unwrap(), json!({"state": "loading"}));

        let failed: QueryResult<u8> = QueryResult::Failure(
            QueryError::new(QueryErrorKind::AuthError, "clave inválida").with_status(401),
        );
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"state": "failure", "data": {"kind": "auth_error", "message": "clave inválida", "status": 401}})
        );
    }

    #[test]
    fn test_combinators() {
        let r: QueryResult<u32> = QueryResult::Success(2);
        assert_eq!(r.clone().map(|v| v * 2), QueryResult::Success(4));
        assert_eq!(
            r.and_then(|_| QueryResult::<u32>::Failure(QueryError::unknown("x")))
                .failure()
                .map(|e| e.kind),
            Some(QueryErrorKind::Unknown)
        );
        assert!(QueryResult::<u32>::Loading.into_result().is_none());
        assert!(QueryResult::<u32>::default().is_idle());
    }
}

use super::executor::QueryExecutor;
use super::state::QueryResult;
use crate::prompt::QueryRequest;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A built request bound to the executor that will send it, typed by the
/// payload it resolves to. Nothing goes over the wire until [`send`](Self::send).
pub struct PendingQuery<T> {
    executor: QueryExecutor,
    request: QueryRequest,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PendingQuery<T> {
    pub(crate) fn new(executor: QueryExecutor, request: QueryRequest) -> Self {
        Self {
            executor,
            request,
            _payload: PhantomData,
        }
    }

    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    pub async fn send(self) -> QueryResult<T> {
        self.executor.execute_as(&self.request).await
    }
}

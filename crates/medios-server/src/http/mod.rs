mod routes;

pub use routes::create_router;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medios_core::{MediaAssistant, SlotRegistry, DEFAULT_SLOT_CAPACITY};
use serde::Serialize;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<MediaAssistant>,
    /// One slot per page operation; payloads are kept as JSON.
    pub slots: Arc<SlotRegistry<serde_json::Value>>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(assistant: Arc<MediaAssistant>) -> Self {
        Self::with_max_slots(assistant, DEFAULT_SLOT_CAPACITY)
    }

    pub fn with_max_slots(assistant: Arc<MediaAssistant>, max_slots: usize) -> Self {
        Self {
            assistant,
            slots: Arc::new(SlotRegistry::with_capacity(max_slots)),
            start_time: std::time::Instant::now(),
        }
    }
}

/// JSON response wrapper
#[derive(Serialize)]
pub struct JsonResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Error type for HTTP handlers. Anything converted with `?` is a 500.
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: err.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow::anyhow!(msg.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        }
        (
            self.status,
            Json(JsonResponse::<()>::err(self.error.to_string())),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

//! Maps upstream failures onto the [`QueryErrorKind`] taxonomy.
//!
//! Precedence: authentication, then rate limiting, then any other status or
//! transport failure. Payload problems are parse errors, explicit "no content"
//! answers are empty results.

use crate::error::{QueryError, QueryErrorKind, UpstreamError};
use serde_json::Value;

/// How an upstream is named in user-facing messages.
#[derive(Debug, Clone, Copy)]
pub struct Upstream {
    /// "servicio de {service}", "servidor de {service}"
    pub service: &'static str,
    /// Subject for credential and quota messages.
    pub api: &'static str,
}

pub const ORACLE_UPSTREAM: Upstream = Upstream {
    service: "IA generativa",
    api: "la API de IA generativa",
};

pub const NEWS_UPSTREAM: Upstream = Upstream {
    service: "noticias",
    api: "la API de noticias",
};

pub const FEED_UPSTREAM: Upstream = Upstream {
    service: "datos externos",
    api: "la fuente de datos externa",
};

const AUTH_MARKERS: &[&str] = &[
    "apiKeyInvalid",
    "apiKeyMissing",
    "apiKeyDisabled",
    "API_KEY_INVALID",
    "UNAUTHENTICATED",
    "PERMISSION_DENIED",
];

const RATE_MARKERS: &[&str] = &["rateLimited", "apiKeyExhausted", "RESOURCE_EXHAUSTED"];

const MAX_MESSAGE_CHARS: usize = 300;

/// Kind for a non-success HTTP answer.
pub fn classify_status(status: u16, body: &str) -> QueryErrorKind {
    if status == 401 || status == 403 || AUTH_MARKERS.iter().any(|m| body.contains(m)) {
        QueryErrorKind::AuthError
    } else if status == 429 || RATE_MARKERS.iter().any(|m| body.contains(m)) {
        QueryErrorKind::RateLimited
    } else {
        QueryErrorKind::NetworkError
    }
}

pub fn classify(err: &UpstreamError, upstream: &Upstream) -> QueryError {
    match err {
        UpstreamError::Transport(detail) => QueryError::network(format!(
            "No se pudo conectar con el servicio de {}: {}",
            upstream.service, detail
        )),
        UpstreamError::Timeout(after) => QueryError::network(format!(
            "La solicitud al servicio de {} excedió el tiempo límite ({:?}).",
            upstream.service, after
        )),
        UpstreamError::Status { status, body } => {
            let kind = classify_status(*status, body);
            let message = match kind {
                QueryErrorKind::AuthError => format!(
                    "Error de autenticación. La clave de {} podría ser inválida o haber expirado.",
                    upstream.api
                ),
                QueryErrorKind::RateLimited => format!(
                    "Se ha excedido el límite de solicitudes a {}. Inténtelo de nuevo más tarde.",
                    upstream.api
                ),
                _ => format!(
                    "Error del servidor de {}: {}",
                    upstream.service,
                    upstream_message(*status, body)
                ),
            };
            QueryError::new(kind, message).with_status(*status)
        }
        UpstreamError::MalformedBody(detail) => QueryError::parse(format!(
            "La respuesta de {} no tiene el formato esperado: {}",
            upstream.api, detail
        )),
        UpstreamError::NoContent(reason) => QueryError::new(
            QueryErrorKind::EmptyResult,
            format!(
                "El servicio de {} no devolvió contenido ({}).",
                upstream.service, reason
            ),
        ),
    }
}

/// Best human-readable message in an error body: a JSON `message` (top level
/// or under `error`), else the trimmed text, else the status reason.
pub fn upstream_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let message = value
            .get("message")
            .or_else(|| value.get("error").and_then(|e| e.get("message")))
            .and_then(Value::as_str);
        if let Some(msg) = message {
            return truncate(msg.trim());
        }
    }

    let text = body.trim();
    if !text.is_empty() {
        return truncate(text);
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

//! In-band records the live feed shows in place of articles.
//!
//! Every sentinel has `url == "#"`, which is how consumers tell them apart
//! from real articles.

use crate::error::QueryError;
use crate::types::NewsArticle;
use chrono::{SecondsFormat, Utc};

pub const NO_RESULTS_TITLE: &str = "No se encontraron noticias";
pub const LOAD_ERROR_TITLE: &str = "Error al Cargar Noticias";
pub const NETWORK_ERROR_TITLE: &str = "Error de Red o CORS";
pub const CONFIG_ERROR_TITLE: &str = "Error de Configuración";

/// Summary of an article that came without a description.
pub const NO_SUMMARY: &str = "No hay resumen disponible.";

pub const SENTINEL_URL: &str = "#";

const NEWS_SERVICE: &str = "Servicio de Noticias";
const SYSTEM: &str = "Sistema";

const NETWORK_SUMMARY: &str = "No se pudo conectar con el servicio de noticias. Verifique su conexión o si alguna extensión del navegador está bloqueando la solicitud.";
const CONFIG_SUMMARY: &str = "La clave de la API de noticias no está configurada. Se requiere una clave para obtener noticias reales.";

pub fn is_sentinel(article: &NewsArticle) -> bool {
    article.url == SENTINEL_URL
}

pub fn no_results(query: &str) -> NewsArticle {
    sentinel(
        NO_RESULTS_TITLE,
        format!(
            "No se encontraron artículos recientes para la consulta: \"{}\". Intente con otros términos.",
            query
        ),
        NEWS_SERVICE,
    )
}

pub fn missing_key() -> NewsArticle {
    sentinel(CONFIG_ERROR_TITLE, CONFIG_SUMMARY.to_string(), SYSTEM)
}

/// The sentinel standing in for a failed search. Depends on the error alone.
pub fn from_error(err: &QueryError) -> NewsArticle {
    if err.is_transport() {
        sentinel(NETWORK_ERROR_TITLE, NETWORK_SUMMARY.to_string(), SYSTEM)
    } else {
        sentinel(LOAD_ERROR_TITLE, err.message.clone(), NEWS_SERVICE)
    }
}

fn sentinel(title: &str, summary: String, source: &str) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        summary,
        source: source.to_string(),
        url: SENTINEL_URL.to_string(),
        published_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;
    use chrono::DateTime;

    #[test]
    fn test_no_results_names_query() {
        let s = no_results("BCV");
        assert_eq!(s.title, NO_RESULTS_TITLE);
        assert!(s.summary.contains("\"BCV\""));
        assert!(is_sentinel(&s));
        assert!(DateTime::parse_from_rfc3339(&s.published_at).is_ok());
    }

    #[test]
    fn test_transport_error_maps_to_network_sentinel() {
        let s = from_error(&QueryError::network("connection refused"));
        assert_eq!(s.title, NETWORK_ERROR_TITLE);
        assert_eq!(s.source, "Sistema");
        assert_eq!(s.summary, NETWORK_SUMMARY);
    }

    #[test]
    fn test_status_errors_keep_message() {
        let err = QueryError::new(
            QueryErrorKind::NetworkError,
            "Error del servidor de noticias: Boom",
        )
        .with_status(500);
        let s = from_error(&err);
        assert_eq!(s.title, LOAD_ERROR_TITLE);
        assert_eq!(s.summary, "Error del servidor de noticias: Boom");
        assert_eq!(s.source, "Servicio de Noticias");
    }
}

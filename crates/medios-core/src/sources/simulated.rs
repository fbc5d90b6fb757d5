use super::{ChannelFeedSource, ChannelList, MetricsSource, TranscriptionSource};
use crate::error::QueryError;
use crate::prompt::{build, PromptIntent};
use crate::query::{QueryExecutor, QueryResult};
use crate::types::{Asset, ChangeType, ChannelMessage, Metric};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Preset news items offered on the alerts page for geopolitical analysis.
pub const GEOPOLITICAL_SAMPLES: [&str; 3] = [
    "El BCV anuncia nuevas medidas para controlar la inflación y estabilizar el mercado cambiario.",
    "Aumentan las exportaciones no tradicionales en un 15% durante el último trimestre, según cifras oficiales.",
    "Tensiones en el mercado petrolero internacional podrían afectar los ingresos fiscales de Venezuela.",
];

/// Channel feed written by the oracle.
pub struct OracleChannelFeed {
    executor: QueryExecutor,
}

impl OracleChannelFeed {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ChannelFeedSource for OracleChannelFeed {
    async fn feed(&self, channels: &ChannelList) -> QueryResult<Vec<ChannelMessage>> {
        let intent = PromptIntent::simulate_channel_feed(channels.as_prompt_param());
        run(&self.executor, intent).await
    }
}

/// Transcript of a fictional audio clip, written by the oracle.
pub struct OracleTranscription {
    executor: QueryExecutor,
}

impl OracleTranscription {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl TranscriptionSource for OracleTranscription {
    async fn transcribe(&self) -> QueryResult<String> {
        run(&self.executor, PromptIntent::simulate_transcript()).await
    }
}

// Parameters are fixed or pre-validated here, so a build failure means a
// broken template and is reported rather than raised.
async fn run<T: DeserializeOwned>(
    executor: &QueryExecutor,
    intent: PromptIntent,
) -> QueryResult<T> {
    match build(intent) {
        Ok(request) => executor.execute_as(&request).await,
        Err(e) => {
            log::error!("Could not build simulated request: {}", e);
            QueryResult::Failure(QueryError::unknown(e.to_string()))
        }
    }
}

/// The dashboard's fixed metric cards and tracked assets.
#[derive(Debug, Clone)]
pub struct StaticMetrics {
    metrics: Vec<Metric>,
    assets: Vec<Asset>,
}

impl Default for StaticMetrics {
    fn default() -> Self {
        Self {
            metrics: vec![
                metric("Menciones en Medios (24h)", "1,284", "+5.2%", ChangeType::Positive),
                metric("Sentimiento General", "Neutral", "-2.1%", ChangeType::Negative),
                metric("Reservas Internacionales (USD)", "$10.5B", "+0.1%", ChangeType::Positive),
                metric("Tipo de Cambio (BCV)", "36.50 VES", "Estable", ChangeType::Neutral),
            ],
            assets: vec![
                asset(
                    "Reservas de Oro",
                    "$7.8B",
                    "+0.5%",
                    ChangeType::Positive,
                    "precio internacional del oro y Venezuela",
                ),
                asset(
                    "Petróleo (WTI)",
                    "$75.60",
                    "-1.2%",
                    ChangeType::Negative,
                    "mercado petrolero WTI y Venezuela",
                ),
                asset(
                    "Tipo de Cambio (EUR)",
                    "39.80 VES",
                    "+0.1%",
                    ChangeType::Negative,
                    "tipo de cambio Euro en Venezuela",
                ),
                asset(
                    "Petro (PTR)",
                    "$60.00",
                    "0.0%",
                    ChangeType::Neutral,
                    "criptoactivo Petro en Venezuela",
                ),
            ],
        }
    }
}

impl StaticMetrics {
    pub fn new(metrics: Vec<Metric>, assets: Vec<Asset>) -> Self {
        Self { metrics, assets }
    }
}

#[async_trait]
impl MetricsSource for StaticMetrics {
    async fn metrics(&self) -> QueryResult<Vec<Metric>> {
        QueryResult::Success(self.metrics.clone())
    }

    async fn assets(&self) -> QueryResult<Vec<Asset>> {
        QueryResult::Success(self.assets.clone())
    }
}

fn metric(title: &str, value: &str, change: &str, change_type: ChangeType) -> Metric {
    Metric {
        title: title.into(),
        value: value.into(),
        change: change.into(),
        change_type,
    }
}

fn asset(
    name: &str,
    value: &str,
    change: &str,
    change_type: ChangeType,
    news_topic: &str,
) -> Asset {
    Asset {
        name: name.into(),
        value: value.into(),
        change: change.into(),
        change_type,
        news_topic: news_topic.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use crate::oracle::Oracle;
    use crate::shape::ResponseShape;
    use std::sync::{Arc, Mutex};

    struct Echo {
        reply: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Oracle for Echo {
        async fn generate(
            &self,
            prompt: &str,
            _shape: Option<&ResponseShape>,
        ) -> Result<String, UpstreamError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.to_string())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_feed_substitutes_channels() {
        let oracle = Arc::new(Echo {
            reply: r#"[{"channel":"@bcv_org_ve","author":"Analista","text":"Reservas estables.","timestamp":"hace 5 minutos"}]"#,
            prompts: Mutex::new(Vec::new()),
        });
        let feed = OracleChannelFeed::new(QueryExecutor::new(oracle.clone()));
        let channels = ChannelList::parse("@bcv_org_ve, @economia_digital").unwrap();

        let messages = feed.feed(&channels).await.into_success().unwrap();
        assert_eq!(messages[0].channel, "@bcv_org_ve");
        assert!(oracle.prompts.lock().unwrap()[0].contains("@bcv_org_ve, @economia_digital"));
    }

    #[tokio::test]
    async fn test_transcript_is_text() {
        let oracle = Arc::new(Echo {
            reply: "  El directorio del BCV informa...  ",
            prompts: Mutex::new(Vec::new()),
        });
        let source = OracleTranscription::new(QueryExecutor::new(oracle));
        assert_eq!(
            source.transcribe().await,
            QueryResult::Success("El directorio del BCV informa...".to_string())
        );
    }

    #[tokio::test]
    async fn test_static_dashboard_values() {
        let source = StaticMetrics::default();
        let metrics = source.metrics().await.into_success().unwrap();
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[3].change_type, ChangeType::Neutral);

        let assets = source.assets().await.into_success().unwrap();
        assert_eq!(assets[1].name, "Petróleo (WTI)");
        assert_eq!(assets[1].news_topic, "mercado petrolero WTI y Venezuela");
    }
}

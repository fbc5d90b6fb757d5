use async_trait::async_trait;
use medios_core::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Oracle answering by the first rule whose needle appears in the prompt.
struct RuleOracle {
    rules: Vec<(&'static str, Duration, &'static str)>,
    calls: AtomicUsize,
}

impl RuleOracle {
    fn new(rules: Vec<(&'static str, Duration, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            rules,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for RuleOracle {
    async fn generate(
        &self,
        prompt: &str,
        _shape: Option<&ResponseShape>,
    ) -> std::result::Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (_, delay, reply) = self
            .rules
            .iter()
            .find(|(needle, _, _)| prompt.contains(needle))
            .ok_or_else(|| UpstreamError::NoContent("no rule".into()))?;
        tokio::time::sleep(*delay).await;
        Ok(reply.to_string())
    }

    fn name(&self) -> &str {
        "rules"
    }
}

struct FixedTransport {
    status: u16,
    body: String,
    urls: Mutex<Vec<String>>,
}

impl FixedTransport {
    fn new(status: u16, body: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            urls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for FixedTransport {
    async fn get(&self, url: &str) -> std::result::Result<RawResponse, UpstreamError> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(RawResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn assistant(oracle: Arc<RuleOracle>, transport: Arc<FixedTransport>) -> MediaAssistant {
    let news = NewsClient::new(transport, NewsConfig::default().with_api_key("news-key"));
    MediaAssistant::new(QueryExecutor::new(oracle), news)
}

fn no_articles() -> Arc<FixedTransport> {
    FixedTransport::new(200, serde_json::json!({"status": "ok", "totalResults": 0, "articles": []}))
}

// ── Prompted operations ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_analyze_topic_end_to_end() {
    init_logging();
    let oracle = RuleOracle::new(vec![(
        "Banco Central de Venezuela",
        Duration::ZERO,
        r#"{"sentiment":"Neutral","keyThemes":["inflación","reservas"],"executiveSummary":"Cobertura equilibrada."}"#,
    )]);
    let assistant = assistant(oracle.clone(), no_articles());

    let result = assistant
        .analyze_topic("Banco Central de Venezuela")
        .unwrap()
        .send()
        .await;

    assert_eq!(
        result,
        QueryResult::Success(TopicAnalysis {
            sentiment: "Neutral".into(),
            key_themes: vec!["inflación".into(), "reservas".into()],
            executive_summary: "Cobertura equilibrada.".into(),
        })
    );
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_blank_topic_never_reaches_oracle() {
    let oracle = RuleOracle::new(vec![]);
    let assistant = assistant(oracle.clone(), no_articles());

    let err = assistant.generate_headlines("   ").err().unwrap();
    assert!(matches!(err, BuildError::BlankParam { .. }));
    assert!(assistant.get_geopolitical_analysis("").is_err());
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_empty_list_is_success() {
    let oracle = RuleOracle::new(vec![("titulares", Duration::ZERO, "[]")]);
    let assistant = assistant(oracle, no_articles());

    let pending = assistant.generate_headlines("reservas").unwrap();
    assert!(pending.request().prompt().contains("titulares"));
    assert_eq!(pending.send().await, QueryResult::Success(vec![]));
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let oracle = RuleOracle::new(vec![(
        "geopolítica",
        Duration::ZERO,
        "Claro, aquí tiene su análisis",
    )]);
    let assistant = assistant(oracle, no_articles());

    let result = assistant
        .get_geopolitical_analysis("Nuevas sanciones petroleras")
        .unwrap()
        .send()
        .await;
    assert_eq!(result.failure().map(|e| e.kind), Some(QueryErrorKind::ParseError));
}

// ── Last-call-wins ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_slot_shows_only_latest_call() {
    let oracle = RuleOracle::new(vec![
        (
            "lento",
            Duration::from_millis(80),
            r#"[{"title":"A","source":"Fuente A","summary":"a"}]"#,
        ),
        (
            "rápido",
            Duration::from_millis(5),
            r#"[{"title":"B","source":"Fuente B","summary":"b"}]"#,
        ),
    ]);
    let assistant = assistant(oracle, no_articles());
    let slot: QuerySlot<Vec<Headline>> = QuerySlot::new("headlines");

    let first = assistant.generate_headlines("tema lento").unwrap();
    let second = assistant.generate_headlines("tema rápido").unwrap();

    let (a, b) = futures::future::join(slot.run(first.send()), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        slot.run(second.send()).await
    })
    .await;

    assert!(a.is_none(), "superseded call must not publish");
    assert!(b.is_some());
    let shown = slot.state().into_success().unwrap();
    assert_eq!(shown[0].title, "B");
}

// ── News feed ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_news_sentinel_for_zero_articles() {
    let transport = no_articles();
    let assistant = assistant(RuleOracle::new(vec![]), transport.clone());

    let items = assistant.fetch_real_news("BCV").await.into_success().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "No se encontraron noticias");
    assert_eq!(items[0].url, "#");

    let urls = transport.urls.lock().unwrap();
    let url = &urls[0];
    assert!(url.contains("q=BCV"));
    assert!(url.contains("pageSize=10"));
}

#[tokio::test]
async fn test_news_auth_failure_is_sentinel_and_typed_error() {
    let transport = FixedTransport::new(
        401,
        serde_json::json!({"status": "error", "code": "apiKeyInvalid", "message": "invalid"}),
    );
    let assistant = assistant(RuleOracle::new(vec![]), transport);

    let items = assistant.fetch_real_news("BCV").await.into_success().unwrap();
    assert_eq!(items[0].title, "Error al Cargar Noticias");
    assert!(items[0].summary.starts_with("Error de autenticación."));

    let err = assistant.search_news("BCV").await.unwrap_err();
    assert_eq!(err.kind, QueryErrorKind::AuthError);
    assert_eq!(err.status, Some(401));
}

// ── Capability sources ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_channel_feed_and_local_data() {
    let oracle = RuleOracle::new(vec![(
        "@bcv_org_ve",
        Duration::ZERO,
        r#"[{"channel":"@bcv_org_ve","author":"Usuario","text":"Nueva tasa oficial","timestamp":"hace 2 minutos"}]"#,
    )]);
    let assistant = assistant(oracle, no_articles());

    let channels = assistant.default_channels().clone();
    let feed = assistant.simulate_channel_feed(&channels).await;
    assert_eq!(feed.success().map(|m| m.len()), Some(1));

    assert_eq!(assistant.dashboard_metrics().await.success().map(|m| m.len()), Some(4));
    assert_eq!(assistant.assets().await.success().map(|a| a.len()), Some(4));

    let series = assistant.economic_activity(30, 42);
    assert_eq!(series.len(), 30);
    assert_eq!(series, assistant.economic_activity(30, 42));
}

#[tokio::test]
async fn test_geopolitical_samples_feed_analysis() {
    let oracle = RuleOracle::new(vec![(
        "exportaciones no tradicionales",
        Duration::ZERO,
        r#"{"summary":"Mejora externa.","keyPoints":["divisas"],"riskAssessment":"Bajo"}"#,
    )]);
    let assistant = assistant(oracle.clone(), no_articles());

    let samples = assistant.geopolitical_samples();
    assert_eq!(samples.len(), 3);
    for sample in samples {
        assert!(assistant.get_geopolitical_analysis(sample).is_ok());
    }

    let analysis = assistant
        .get_geopolitical_analysis(samples[1])
        .unwrap()
        .send()
        .await
        .into_success()
        .unwrap();
    assert_eq!(analysis.risk_assessment, "Bajo");
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn test_from_config_fails_fast_without_keys() {
    let err = MediaAssistant::from_config(&AssistantConfig::default()).err().unwrap();
    match err {
        MediosError::Config(msg) => {
            assert!(msg.contains("GEMINI_API_KEY"));
            assert!(msg.contains("NEWS_API_KEY"));
        }
        other => panic!("expected config error, got {other}"),
    }
}

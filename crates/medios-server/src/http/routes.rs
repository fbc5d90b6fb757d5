use super::{AppError, AppResult, AppState, JsonResponse};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{Datelike, Utc};
use medios_core::{
    ActivityPoint, Asset, ChannelList, Metric, NewsArticle, QueryError, QueryResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

const MAX_ACTIVITY_DAYS: usize = 365;
const DEFAULT_ACTIVITY_DAYS: usize = 30;

/// Dashboard session a request belongs to. Slots of different clients never
/// share state.
const CLIENT_HEADER: &str = "x-client-id";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Prompted operations, each published through a slot
        .route("/analysis", post(analyze_topic))
        .route("/headlines", post(generate_headlines))
        .route("/content", post(generate_content))
        .route("/geopolitics", post(geopolitical_analysis))
        .route("/geopolitics/samples", get(geopolitical_samples))
        .route("/channels/feed", post(channel_feed))
        .route("/transcripts", post(transcript))
        .route("/assets/:name/news", get(asset_news))
        .route("/slots/:slot", get(slot_state))
        // Feeds and local data
        .route("/news", get(news))
        .route("/metrics", get(metrics))
        .route("/assets", get(assets))
        .route("/activity", get(activity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    version: String,
    uptime_seconds: u64,
    oracle: String,
    slots: usize,
    slot_capacity: usize,
}

async fn health(State(state): State<AppState>) -> Json<JsonResponse<HealthResponse>> {
    Json(JsonResponse::ok(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        oracle: state.assistant.executor().oracle_name().to_string(),
        slots: state.slots.len(),
        slot_capacity: state.slots.capacity(),
    }))
}

// --- Slots ---

#[derive(Serialize)]
struct SlotResponse {
    slot: String,
    /// A newer call on the same slot started before this one resolved. The
    /// outcome of this call was discarded and `result` is absent.
    superseded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<QueryResult<Value>>,
}

/// `requested` or `default`, prefixed with the caller's client id when given.
fn slot_key(
    headers: &HeaderMap,
    requested: Option<String>,
    default: impl FnOnce() -> String,
) -> String {
    let operation = requested.unwrap_or_else(default);
    let client = headers
        .get(CLIENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|c| !c.is_empty());
    match client {
        Some(client) => format!("{}:{}", client, operation),
        None => operation,
    }
}

async fn run_in_slot<T, F>(
    state: &AppState,
    key: String,
    query: F,
) -> Json<JsonResponse<SlotResponse>>
where
    T: Serialize,
    F: Future<Output = QueryResult<T>>,
{
    let slot = state.slots.slot(&key);
    let published = slot.run(async { query.await.and_then(to_json) }).await;

    if published.is_none() {
        debug!("Slot '{}' superseded", key);
    }
    let response = SlotResponse {
        slot: key,
        superseded: published.is_none(),
        result: published,
    };
    Json(JsonResponse::ok(response))
}

fn to_json<T: Serialize>(value: T) -> QueryResult<Value> {
    match serde_json::to_value(value) {
        Ok(v) => QueryResult::Success(v),
        Err(e) => QueryResult::Failure(QueryError::unknown(e.to_string())),
    }
}

#[derive(Serialize)]
struct SlotState {
    slot: String,
    result: QueryResult<Value>,
}

async fn slot_state(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> AppResult<Json<JsonResponse<SlotState>>> {
    let current = state
        .slots
        .get(&slot)
        .ok_or_else(|| AppError::not_found(format!("Unknown slot: {}", slot)))?;
    Ok(Json(JsonResponse::ok(SlotState {
        result: current.state(),
        slot,
    })))
}

// --- Prompted operations ---

#[derive(Deserialize)]
struct TopicRequest {
    topic: String,
    #[serde(default)]
    slot: Option<String>,
}

async fn analyze_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TopicRequest>,
) -> AppResult<Json<JsonResponse<SlotResponse>>> {
    let pending = state
        .assistant
        .analyze_topic(&body.topic)
        .map_err(AppError::bad_request)?;
    let key = slot_key(&headers, body.slot, || "analysis".into());
    Ok(run_in_slot(&state, key, pending.send()).await)
}

async fn generate_headlines(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TopicRequest>,
) -> AppResult<Json<JsonResponse<SlotResponse>>> {
    let pending = state
        .assistant
        .generate_headlines(&body.topic)
        .map_err(AppError::bad_request)?;
    let topic = body.topic.trim();
    let key = slot_key(&headers, body.slot, || format!("headlines:{}", topic));
    Ok(run_in_slot(&state, key, pending.send()).await)
}

#[derive(Deserialize)]
struct ContentRequest {
    topic: String,
    content_type: String,
    #[serde(default)]
    slot: Option<String>,
}

async fn generate_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ContentRequest>,
) -> AppResult<Json<JsonResponse<SlotResponse>>> {
    let pending = state
        .assistant
        .generate_content_draft(&body.topic, &body.content_type)
        .map_err(AppError::bad_request)?;
    let key = slot_key(&headers, body.slot, || "content".into());
    Ok(run_in_slot(&state, key, pending.send()).await)
}

#[derive(Deserialize)]
struct GeopoliticsRequest {
    news_summary: String,
    #[serde(default)]
    slot: Option<String>,
}

async fn geopolitical_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GeopoliticsRequest>,
) -> AppResult<Json<JsonResponse<SlotResponse>>> {
    let pending = state
        .assistant
        .get_geopolitical_analysis(&body.news_summary)
        .map_err(AppError::bad_request)?;
    let key = slot_key(&headers, body.slot, || "geopolitics".into());
    Ok(run_in_slot(&state, key, pending.send()).await)
}

#[derive(Deserialize)]
struct ChannelFeedRequest {
    /// Comma-separated handles; the configured defaults when absent.
    #[serde(default)]
    channels: Option<String>,
    #[serde(default)]
    slot: Option<String>,
}

async fn channel_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChannelFeedRequest>,
) -> AppResult<Json<JsonResponse<SlotResponse>>> {
    let channels = match &body.channels {
        Some(raw) => ChannelList::parse(raw).map_err(AppError::bad_request)?,
        None => state.assistant.default_channels().clone(),
    };
    let key = slot_key(&headers, body.slot, || "channels".into());
    let assistant = state.assistant.clone();
    Ok(run_in_slot(&state, key, async move {
        assistant.simulate_channel_feed(&channels).await
    })
    .await)
}

async fn transcript(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<JsonResponse<SlotResponse>> {
    let key = slot_key(&headers, None, || "transcripts".into());
    let assistant = state.assistant.clone();
    run_in_slot(&state, key, async move {
        assistant.simulate_transcript().await
    })
    .await
}

async fn asset_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> AppResult<Json<JsonResponse<SlotResponse>>> {
    let assets = match state.assistant.assets().await.into_result() {
        Some(Ok(assets)) => assets,
        Some(Err(e)) => return Err(e.into()),
        None => return Err(anyhow::anyhow!("asset source did not resolve").into()),
    };
    let asset = assets
        .into_iter()
        .find(|a| a.name == name)
        .ok_or_else(|| AppError::not_found(format!("Unknown asset: {}", name)))?;

    let pending = state
        .assistant
        .generate_headlines(&asset.news_topic)
        .map_err(AppError::bad_request)?;
    let key = slot_key(&headers, None, || format!("assets:{}", asset.name));
    Ok(run_in_slot(&state, key, pending.send()).await)
}

async fn geopolitical_samples(
    State(state): State<AppState>,
) -> Json<JsonResponse<&'static [&'static str]>> {
    Json(JsonResponse::ok(state.assistant.geopolitical_samples()))
}

// --- Feeds and local data ---

#[derive(Deserialize)]
struct NewsQuery {
    q: Option<String>,
}

async fn news(
    State(state): State<AppState>,
    Query(params): Query<NewsQuery>,
) -> Json<JsonResponse<QueryResult<Vec<NewsArticle>>>> {
    let query = params.q.unwrap_or_default();
    Json(JsonResponse::ok(state.assistant.fetch_real_news(&query).await))
}

async fn metrics(
    State(state): State<AppState>,
) -> Json<JsonResponse<QueryResult<Vec<Metric>>>> {
    Json(JsonResponse::ok(state.assistant.dashboard_metrics().await))
}

async fn assets(State(state): State<AppState>) -> Json<JsonResponse<QueryResult<Vec<Asset>>>> {
    Json(JsonResponse::ok(state.assistant.assets().await))
}

#[derive(Deserialize)]
struct ActivityQuery {
    days: Option<usize>,
    seed: Option<u64>,
}

async fn activity(
    State(state): State<AppState>,
    Query(params): Query<ActivityQuery>,
) -> AppResult<Json<JsonResponse<Vec<ActivityPoint>>>> {
    let days = params.days.unwrap_or(DEFAULT_ACTIVITY_DAYS);
    if !(1..=MAX_ACTIVITY_DAYS).contains(&days) {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "days must be within 1..={}, got {}",
            MAX_ACTIVITY_DAYS,
            days
        )));
    }
    // Same series all day unless the caller pins a seed.
    let seed = params
        .seed
        .unwrap_or_else(|| Utc::now().date_naive().num_days_from_ce() as u64);
    Ok(Json(JsonResponse::ok(state.assistant.economic_activity(days, seed))))
}

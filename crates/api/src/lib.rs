mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use labelscan_core::ScanRequest;
use labelscan_dispatch::HybridDispatcher;
use labelscan_observability::AppMetrics;
use labelscan_provider::OpenAiProvider;
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

pub use crate::rate_limit::IpRateLimiter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX: usize = 30;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub body_limit_bytes: usize,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let bind = env::var("LABELSCAN_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let body_limit_bytes = env::var("LABELSCAN_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_BODY_LIMIT_BYTES);
        let rate_limit_window = Duration::from_secs(
            env::var("LABELSCAN_RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
        );
        let rate_limit_max = env::var("LABELSCAN_RATE_LIMIT_MAX")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX);

        Self {
            bind,
            body_limit_bytes,
            rate_limit_window,
            rate_limit_max,
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: HybridDispatcher<OpenAiProvider>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: labelscan_observability::MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    provider: bool,
    model: Option<String>,
}

/// Builds the service from environment configuration. Without a provider key
/// every request is answered by the local heuristic.
pub fn build_app(config: &ApiConfig) -> Result<Router> {
    let provider = OpenAiProvider::from_env().context("failed to configure label provider")?;
    Ok(build_app_with_provider(provider, config))
}

pub fn build_app_with_provider(provider: Option<OpenAiProvider>, config: &ApiConfig) -> Router {
    let metrics = AppMetrics::shared();
    let state = ApiState {
        dispatcher: HybridDispatcher::new(provider, metrics.clone()),
        metrics,
        limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
    };
    build_router(state, config)
}

pub fn build_router(state: ApiState, config: &ApiConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/analyze", post(analyze))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

pub async fn serve(config: ApiConfig) -> Result<()> {
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, "label scan api started");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let provider = state.dispatcher.provider();
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            provider: provider.is_some(),
            model: provider.map(|provider| provider.config().model.clone()),
        },
    };
    (StatusCode::OK, Json(payload))
}

async fn analyze(State(state): State<ApiState>, body: Bytes) -> impl IntoResponse {
    // An unreadable body is an empty request, not a client error.
    let request = serde_json::from_slice::<ScanRequest>(&body).unwrap_or_else(|err| {
        debug!(error = %err, body_len = body.len(), "analyze body ignored");
        ScanRequest::default()
    });

    let resolution = state.dispatcher.resolve(request).await;
    (StatusCode::OK, Json(resolution))
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}

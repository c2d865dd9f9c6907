mod rate_limit;
pub mod render;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Form, Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use triage_agents::TriagePipeline;
use triage_core::{NextAction, TriageError, DEFAULT_CITY};
use triage_llm::{GeminiConfig, Generator, TextGenerator};
use triage_observability::AppMetrics;

pub use crate::rate_limit::IpRateLimiter;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<TriagePipeline<Generator>>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
    pub default_city: Arc<str>,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub default_city: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            default_city: DEFAULT_CITY.to_string(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 30,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind = env::var("TRIAGE_BIND").unwrap_or(defaults.bind);
        let default_city = env::var("TRIAGE_DEFAULT_CITY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.default_city);
        let rate_limit_window = match env::var("TRIAGE_RATE_LIMIT_WINDOW_SECONDS") {
            Ok(value) => Duration::from_secs(
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid TRIAGE_RATE_LIMIT_WINDOW_SECONDS {value:?}"))?,
            ),
            Err(_) => defaults.rate_limit_window,
        };
        let rate_limit_max = match env::var("TRIAGE_RATE_LIMIT_MAX") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid TRIAGE_RATE_LIMIT_MAX {value:?}"))?,
            Err(_) => defaults.rate_limit_max,
        };

        Ok(Self {
            bind,
            default_city,
            rate_limit_window,
            rate_limit_max,
        })
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    generator: &'static str,
    metrics: triage_observability::MetricsSnapshot,
}

#[derive(Debug, Default, Deserialize)]
struct TriageForm {
    #[serde(default)]
    symptom: String,
    #[serde(default)]
    city: String,
}

#[derive(Debug, Default, Deserialize)]
struct NextActionForm {
    #[serde(default)]
    choice: String,
}

#[derive(Debug, Deserialize)]
struct TriageRequest {
    #[serde(default)]
    symptom: String,
    city: Option<String>,
}

/// Production wiring: the Gemini credential is required and its absence
/// stops startup.
pub fn build_app(settings: ServerSettings) -> Result<Router> {
    let config = GeminiConfig::from_env().context("text-generation service is not configured")?;
    let generator = Generator::gemini(&config).context("failed to build Gemini client")?;
    tracing::info!(model = %config.model, "text generation configured");

    Ok(build_app_with_generator(generator, &settings))
}

pub fn build_app_with_generator(generator: Generator, settings: &ServerSettings) -> Router {
    let metrics = AppMetrics::shared();
    let pipeline = Arc::new(TriagePipeline::new(Arc::new(generator), metrics.clone()));

    let state = ApiState {
        pipeline,
        metrics,
        limiter: IpRateLimiter::new(settings.rate_limit_window, settings.rate_limit_max),
        default_city: Arc::from(settings.default_city.as_str()),
    };

    build_router(state)
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/triage", post(triage_form))
        .route("/next-action", post(next_action))
        .route("/health", get(health))
        .route("/v1/triage", post(triage_json))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn index(State(state): State<ApiState>) -> Html<String> {
    Html(render::form_page("", &state.default_city, None))
}

async fn triage_form(State(state): State<ApiState>, Form(form): Form<TriageForm>) -> Response {
    match state.pipeline.submit(&form.symptom, &form.city).await {
        Ok(record) => Html(render::result_page(&record)).into_response(),
        Err(err) if err.is_input_error() => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(render::form_page(
                &form.symptom,
                &form.city,
                Some(&err.to_string()),
            )),
        )
            .into_response(),
        Err(_) => (StatusCode::BAD_GATEWAY, Html(render::failure_page())).into_response(),
    }
}

async fn next_action(Form(form): Form<NextActionForm>) -> Response {
    match NextAction::parse(&form.choice) {
        Some(action) => Html(render::next_action_page(action)).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Html(render::message_page("Please choose one of the offered next actions.")),
        )
            .into_response(),
    }
}

async fn triage_json(
    State(state): State<ApiState>,
    Json(request): Json<TriageRequest>,
) -> Response {
    let city = request
        .city
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| state.default_city.to_string());

    match state.pipeline.submit(&request.symptom, &city).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        generator: state.pipeline.generator().name(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

fn error_response(err: &TriageError) -> Response {
    let (status, message) = match err {
        TriageError::EmptyInput | TriageError::InputTooLong { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        TriageError::Generation { .. } => (
            StatusCode::BAD_GATEWAY,
            "the text-generation service failed; no result was produced".to_string(),
        ),
    };

    (
        status,
        Json(serde_json::json!({
            "error": err.code(),
            "message": message
        })),
    )
        .into_response()
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
    if let Err(retry_after) = state.limiter.check(&ip) {
        warn!(ip = %ip, "rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}

/// First `x-forwarded-for` hop, else the peer address when the server was
/// started with connect info.
fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static(
            "default-src 'none'; style-src 'unsafe-inline'; form-action 'self'; frame-ancestors 'none'; base-uri 'none'",
        ),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );

    response
}

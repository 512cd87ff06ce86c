//! HTTP facade over the forecast pipeline.
//!
//! Thin translation layer: query params in, JSON out, pipeline errors
//! mapped to their HTTP status codes. All behavior lives in the core.

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::types::{ForecastRequest, Unit};
use common::GatewayError;
use gateway_core::{resolve_client_ip, Orchestrator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Query params for GET /v1/forecast.
#[derive(Deserialize)]
pub struct ForecastParams {
    pub lat: f64,
    pub lon: f64,
    pub location_name: String,
    #[serde(default)]
    pub unit: Unit,
}

/// One row of the usage report.
#[derive(Serialize)]
pub struct StatsDay {
    pub date: String,
    pub api: u64,
    pub cache: u64,
    pub blocked: u64,
}

fn error_response(err: GatewayError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> std::net::IpAddr {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());
    resolve_client_ip(forwarded_for, real_ip, Some(peer.ip()))
}

/// GET /v1/forecast - Run one request through the pipeline
async fn get_forecast(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<ForecastParams>,
) -> Response {
    let request = ForecastRequest {
        latitude: params.lat,
        longitude: params.lon,
        location_name: params.location_name,
        unit: params.unit,
    };
    let client = client_ip(&headers, peer);

    match state.orchestrator.forecast(&request, client).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => error_response(err),
    }
}

/// GET /v1/stats - Seven-day usage report, oldest day first
async fn get_stats(State(state): State<AppState>) -> Json<Vec<StatsDay>> {
    let days = state
        .orchestrator
        .stats()
        .report()
        .into_iter()
        .map(|(date, day)| StatsDay {
            date: date.format("%Y-%m-%d").to_string(),
            api: day.api,
            cache: day.cache,
            blocked: day.blocked,
        })
        .collect();
    Json(days)
}

/// POST /v1/cache/flush - Drop cached forecasts and usage counters
async fn flush_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.orchestrator.flush_cache();
    Json(json!({ "flushed": true }))
}

/// GET /health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Create the HTTP router
pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = AppState { orchestrator };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/v1/forecast", get(get_forecast))
        .route("/v1/stats", get(get_stats))
        .route("/v1/cache/flush", post(flush_cache))
        .layer(cors)
        .with_state(state)
}

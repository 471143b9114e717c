use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DbHealth;
use crate::state::AppState;

const PING_TIMEOUT: Duration = Duration::from_secs(2);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
        .route("/info", get(info))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    time: String,
    uptime: u64,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    time: String,
    uptime: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_latency_ms: Option<u64>,
    time: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    service: &'static str,
    version: &'static str,
    start_time: String,
    uptime: u64,
}

async fn root(State(state): State<AppState>) -> Response {
    let health = state.db().ping(PING_TIMEOUT).await;
    let ok = matches!(health, DbHealth::Connected { .. });

    let response = HealthResponse {
        status: if ok { "ok" } else { "degraded" },
        database: database_label(health),
        time: now_iso(),
        uptime: state.uptime_seconds(),
    };

    (status_for(ok), Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "healthy",
        time: now_iso(),
        uptime: state.uptime_seconds(),
    })
}

async fn ready(State(state): State<AppState>) -> Response {
    let health = state.db().ping(PING_TIMEOUT).await;
    let (status, latency) = match health {
        DbHealth::Connected { latency_ms } => ("healthy", Some(latency_ms)),
        DbHealth::Timeout => ("degraded", None),
        DbHealth::Disconnected => ("unhealthy", None),
    };

    let response = ReadinessResponse {
        status,
        database: database_label(health),
        database_latency_ms: latency,
        time: now_iso(),
    };

    (status_for(status != "unhealthy"), Json(response)).into_response()
}

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let start_time: DateTime<Utc> = state.started_at_system().into();
    Json(InfoResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        start_time: start_time.to_rfc3339(),
        uptime: state.uptime_seconds(),
    })
}

fn database_label(health: DbHealth) -> &'static str {
    match health {
        DbHealth::Connected { .. } => "connected",
        DbHealth::Timeout => "timeout",
        DbHealth::Disconnected => "disconnected",
    }
}

fn status_for(ok: bool) -> StatusCode {
    if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

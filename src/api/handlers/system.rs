//! System endpoints: health check and live room stats.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Live room statistics.
#[derive(Debug, Serialize, ToSchema)]
struct StatsResponse {
    live_rooms: usize,
    active_sessions: usize,
}

/// `GET /stats` — In-memory room and session counts.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "System",
    summary = "Live room statistics",
    description = "Returns the number of rooms currently held in memory and the total attached sessions across them.",
    responses(
        (status = 200, description = "Current counters", body = StatsResponse),
    )
)]
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.rooms.registry().live_rooms().await;
    let mut active_sessions = 0;
    for room in &rooms {
        active_sessions += room.session_count().await;
    }

    (
        StatusCode::OK,
        Json(StatsResponse {
            live_rooms: rooms.len(),
            active_sessions,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
}

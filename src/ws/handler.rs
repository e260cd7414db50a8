//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;

/// Query parameters of the sync endpoint.
#[derive(Debug, Deserialize)]
pub struct SyncParams {
    /// Target board identifier. Validated inside the connection task so
    /// the rejection arrives as a proper close frame, not an HTTP error.
    #[serde(rename = "boardId")]
    pub board_id: Option<String>,
}

/// `GET /sync?boardId=...` — Upgrade HTTP connection to WebSocket.
pub async fn sync_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<SyncParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let rooms = Arc::clone(&state.rooms);
    ws.on_upgrade(move |socket| run_connection(socket, rooms, params.board_id))
}

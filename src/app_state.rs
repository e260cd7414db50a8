//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::persistence::postgres::PostgresStore;
use crate::service::RoomService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Room lifecycle and persistence manager.
    pub rooms: Arc<RoomService<PostgresStore>>,
    /// Storage backend for the thin REST handlers.
    pub store: Arc<PostgresStore>,
    /// Gateway configuration (intervals, limits).
    pub config: Arc<GatewayConfig>,
}

//! boardsync-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket sync endpoints,
//! and flushes every live room on graceful shutdown.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use boardsync_gateway::api;
use boardsync_gateway::app_state::AppState;
use boardsync_gateway::config::GatewayConfig;
use boardsync_gateway::engine::BroadcastEngineFactory;
use boardsync_gateway::persistence::postgres::PostgresStore;
use boardsync_gateway::service::RoomService;
use boardsync_gateway::ws::handler::sync_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting boardsync-gateway");

    // Connect to PostgreSQL and bootstrap the schema
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database_connect_timeout_secs,
        ))
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PostgresStore::new(pool));
    store.init_schema().await?;

    // Build the room lifecycle service
    let rooms = Arc::new(RoomService::new(
        Arc::clone(&store),
        Box::new(BroadcastEngineFactory),
        config.room_config(),
    ));

    // Build application state
    let app_state = AppState {
        rooms: Arc::clone(&rooms),
        store,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/sync", get(sync_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush every live room before exiting so the grace window cannot
    // swallow unsaved edits.
    rooms.shutdown().await;

    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

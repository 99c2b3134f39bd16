//! HTTP server setup and routing
//!
//! Serves the kiosk page, the SSE command stream it subscribes to, and
//! the endpoints the page and operators post back to.

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tubeloop_common::{Error, Result};

use crate::orchestrator::OrchestratorHandle;
use crate::player::BridgePlayer;
use crate::sse::KioskBroadcaster;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub handle: OrchestratorHandle,
    pub bridge: Arc<BridgePlayer>,
    pub broadcaster: KioskBroadcaster,
}

/// Build the router with all routes
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Kiosk page and its command stream
        .route("/", get(super::handlers::kiosk_page))
        .route("/events", get(super::handlers::events))
        // Events relayed back from the embedded player
        .route("/player/event", post(super::handlers::player_event))
        // Operator controls
        .route("/skip", post(super::handlers::skip))
        .route("/status", get(super::handlers::status))
        .route("/health", get(super::handlers::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Run the HTTP server until shutdown.
pub async fn run(ctx: AppContext, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Storage)?;
    info!("video player listening on {addr}");

    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Http(e.to_string()))?;

    info!("video player shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

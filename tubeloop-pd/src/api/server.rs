//! HTTP server setup and routing
//!
//! The selection boundary the orchestrator talks to, plus a couple of
//! administrative channel endpoints for operators.

use crate::selector::engine::SelectionEngine;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tubeloop_common::storage::Store;
use tubeloop_common::{Error, Result};

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<SelectionEngine>,
    pub store: Store,
}

/// Build the router with all routes
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Selection boundary
        .route("/api/next", get(super::handlers::next_video))
        .route("/api/played", post(super::handlers::mark_played))
        // Channel administration
        .route("/api/admin/channel", post(super::handlers::add_channel))
        .route("/api/admin/channels", get(super::handlers::list_channels))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Run the HTTP API server until shutdown.
pub async fn run(ctx: AppContext, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Storage)?;
    info!("program director listening on {addr}");

    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Http(e.to_string()))?;

    info!("program director shutdown complete");
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

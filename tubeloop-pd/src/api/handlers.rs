//! HTTP request handlers
//!
//! Status mapping for the selection boundary: 200 with the projection, 404
//! when nothing is eligible even after relaxation, 500 for a configuration
//! error or unexpected failure. No error ever carries a stack trace — the
//! kiosk only shows short human-readable strings.

use crate::api::server::AppContext;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use tubeloop_common::config::KioskConfig;
use tubeloop_common::model::{Channel, NextVideo};
use tubeloop_common::storage::CONFIG_DOC;
use tubeloop_common::Error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct PlayedRequest {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddChannelRequest {
    id: Option<String>,
    title: Option<String>,
    weight: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    ok: bool,
    channels: Vec<Channel>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "program_director".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Selection Boundary
// ============================================================================

/// GET /api/next - Select the next eligible video
pub async fn next_video(
    State(ctx): State<AppContext>,
) -> Result<Json<NextVideo>, ApiError> {
    match ctx.engine.select_next().await {
        Ok(Some(video)) => Ok(Json(video)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "no eligible video available",
        )),
        Err(e @ Error::NoChannels) => {
            error!("selection failed: {e}");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
        Err(e) => {
            error!("selection failed: {e}");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error selecting next video",
            ))
        }
    }
}

/// POST /api/played - Record a video as played
pub async fn mark_played(
    State(ctx): State<AppContext>,
    Json(req): Json<PlayedRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let Some(video_id) = req.video_id.filter(|id| !id.is_empty()) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "videoId required"));
    };

    match ctx.engine.record_played(&video_id).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            error!(video = %video_id, "failed to record play: {e}");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to record play",
            ))
        }
    }
}

// ============================================================================
// Channel Administration
// ============================================================================

/// POST /api/admin/channel - Add a channel to the configuration
pub async fn add_channel(
    State(ctx): State<AppContext>,
    Json(req): Json<AddChannelRequest>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let Some(id) = req.id.filter(|id| !id.is_empty()) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "channel id required"));
    };

    let mut config: KioskConfig = ctx.store.read_or_default(CONFIG_DOC);
    if config.channels.iter().any(|c| c.id == id) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "channel already configured",
        ));
    }

    config.channels.push(Channel {
        title: Some(req.title.unwrap_or_else(|| id.clone())),
        weight: req.weight.unwrap_or(1),
        id,
    });

    if let Err(e) = ctx.store.write(CONFIG_DOC, &config) {
        error!("failed to persist configuration: {e}");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to persist configuration",
        ));
    }

    info!(channels = config.channels.len(), "channel added");
    Ok(Json(ChannelsResponse {
        ok: true,
        channels: config.channels,
    }))
}

/// GET /api/admin/channels - List configured channels
pub async fn list_channels(State(ctx): State<AppContext>) -> Json<Vec<Channel>> {
    let config: KioskConfig = ctx.store.read_or_default(CONFIG_DOC);
    Json(config.channels)
}

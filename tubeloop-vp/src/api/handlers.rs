//! HTTP handlers for the video player

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::Html;
use axum::Json;
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;

use tubeloop_common::events::PlayerEvent;

use super::server::AppContext;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "tubeloop-vp".to_string(),
    })
}

/// GET / - the kiosk page hosting the embedded player
pub async fn kiosk_page() -> Html<&'static str> {
    Html(include_str!("kiosk.html"))
}

/// GET /events - SSE command stream for the kiosk page
pub async fn events(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    ctx.broadcaster.handle_sse_connection()
}

/// POST /player/event - player lifecycle events relayed by the page
pub async fn player_event(
    State(ctx): State<AppContext>,
    Json(event): Json<PlayerEvent>,
) -> Json<OkResponse> {
    // Durations ride along on ready/playing; remember them before the
    // orchestrator asks
    match &event {
        PlayerEvent::Ready {
            duration: Some(seconds),
        }
        | PlayerEvent::Playing {
            duration: Some(seconds),
        } => ctx.bridge.note_duration(*seconds),
        _ => {}
    }
    ctx.handle.player_event(event);
    Json(OkResponse { ok: true })
}

/// POST /skip - force the current item off the screen
pub async fn skip(State(ctx): State<AppContext>) -> Json<OkResponse> {
    ctx.handle.skip();
    Json(OkResponse { ok: true })
}

/// GET /status - latest orchestrator status line
pub async fn status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: ctx.handle.status(),
    })
}

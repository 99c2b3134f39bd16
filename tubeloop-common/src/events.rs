//! Event types exchanged with the kiosk display page
//!
//! The orchestrator pushes `KioskEvent`s to the page over SSE (player
//! commands and status text); the page posts `PlayerEvent`s back as the
//! embed widget reports them. The page holds no policy — every decision is
//! made on the orchestrator side.

use serde::{Deserialize, Serialize};

/// Events streamed to the kiosk page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KioskEvent {
    /// Load a video into the embed player (create the player if needed)
    LoadVideo { video_id: String, title: String },

    /// Stop playback of the current video
    StopVideo,

    /// Tear down the embed player instance
    DestroyPlayer,

    /// Human-readable status overlay text
    Status { message: String },

    /// Informational: what the orchestrator considers current
    NowPlaying { video_id: String, title: String },
}

/// Embed player events reported back by the kiosk page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// Player is ready; duration in seconds when already known
    Ready {
        #[serde(default)]
        duration: Option<f64>,
    },

    /// Playback state changed to playing
    Playing {
        #[serde(default)]
        duration: Option<f64>,
    },

    /// Video ended naturally
    Ended,

    /// Embed reported an unplayable or blocked video
    PlayerError {
        #[serde(default)]
        code: Option<i32>,
    },
}

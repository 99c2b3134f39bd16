//! Orchestrator state and tuning knobs

use std::time::Duration;

use tubeloop_common::model::NextVideo;

/// Where the kiosk is in its playback lifecycle.
#[derive(Debug, Clone)]
pub enum KioskState {
    /// Nothing loaded, nothing in flight.
    Idle,
    /// A next-video request is outstanding (or a retry is scheduled).
    AwaitingNext,
    /// An item is loaded in the player.
    Playing { video: NextVideo },
}

impl KioskState {
    pub fn is_playing(&self) -> bool {
        matches!(self, KioskState::Playing { .. })
    }

    pub fn current_video_id(&self) -> Option<&str> {
        match self {
            KioskState::Playing { video } => Some(&video.video_id),
            _ => None,
        }
    }
}

/// Timing parameters for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// How far before the end of the current item the upcoming slot is filled.
    pub preload_lead_secs: u32,
    /// Wait between attempts when selection returns nothing or fails.
    pub retry_interval: Duration,
    /// Hard cap on how long any one item may play before a forced skip.
    pub max_video_duration: Duration,
    /// Prefetch attempts closer together than this are dropped.
    pub prefetch_debounce_ms: i64,
    /// How often to re-ask the player for a duration it has not reported yet.
    pub duration_poll: Duration,
    /// Prefetch delay for items too short for the normal lead.
    pub short_item_fire: Duration,
    /// Floor on any computed prefetch delay.
    pub min_fire: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            preload_lead_secs: 8,
            retry_interval: Duration::from_secs(10),
            max_video_duration: Duration::from_secs(300),
            prefetch_debounce_ms: 2000,
            duration_poll: Duration::from_secs(2),
            short_item_fire: Duration::from_millis(500),
            min_fire: Duration::from_millis(200),
        }
    }
}

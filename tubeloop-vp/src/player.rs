//! Embedded player abstraction
//!
//! The orchestrator never talks to a real player directly. It issues
//! commands through [`EmbedPlayer`]; in production the implementation is
//! [`BridgePlayer`], which relays commands to the kiosk page over SSE and
//! remembers the duration the page last reported for the loaded item.

use std::sync::Mutex;

use tubeloop_common::events::KioskEvent;
use tubeloop_common::model::NextVideo;

use crate::sse::KioskBroadcaster;

/// Commands the orchestrator issues to the embedded player.
pub trait EmbedPlayer: Send + Sync {
    /// Load a video and begin (muted) playback.
    fn load(&self, video: &NextVideo);

    /// Stop playback of the current item.
    fn stop(&self);

    /// Tear the player instance down entirely.
    ///
    /// The kiosk page recreates the iframe on the next load, which clears
    /// faulted player state after an embed error.
    fn destroy(&self);

    /// Duration of the loaded item in seconds, if the player has reported
    /// one yet. Live streams and just-loaded items report `None`.
    fn duration(&self) -> Option<f64>;
}

/// Relays player commands to the kiosk page over SSE.
pub struct BridgePlayer {
    broadcaster: KioskBroadcaster,
    last_duration: Mutex<Option<f64>>,
}

impl BridgePlayer {
    pub fn new(broadcaster: KioskBroadcaster) -> Self {
        Self {
            broadcaster,
            last_duration: Mutex::new(None),
        }
    }

    /// Record the duration the page reported for the current item.
    ///
    /// Zero and negative values are what the embed API returns before
    /// metadata arrives; they are not real durations.
    pub fn note_duration(&self, seconds: f64) {
        if seconds > 0.0 {
            if let Ok(mut guard) = self.last_duration.lock() {
                *guard = Some(seconds);
            }
        }
    }
}

impl EmbedPlayer for BridgePlayer {
    fn load(&self, video: &NextVideo) {
        if let Ok(mut guard) = self.last_duration.lock() {
            *guard = None;
        }
        self.broadcaster.send(KioskEvent::LoadVideo {
            video_id: video.video_id.clone(),
            title: video.title.clone(),
        });
    }

    fn stop(&self) {
        self.broadcaster.send(KioskEvent::StopVideo);
    }

    fn destroy(&self) {
        if let Ok(mut guard) = self.last_duration.lock() {
            *guard = None;
        }
        self.broadcaster.send(KioskEvent::DestroyPlayer);
    }

    fn duration(&self) -> Option<f64> {
        self.last_duration.lock().ok().and_then(|guard| *guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video() -> NextVideo {
        NextVideo {
            video_id: "abc123".to_string(),
            title: "Sample".to_string(),
            channel_id: "UCx".to_string(),
            published: None,
            duration_seconds: Some(120),
            view_count: None,
            embeddable: Some(true),
        }
    }

    #[test]
    fn duration_is_unknown_until_reported() {
        let player = BridgePlayer::new(KioskBroadcaster::new(4));
        assert_eq!(player.duration(), None);

        player.note_duration(95.5);
        assert_eq!(player.duration(), Some(95.5));
    }

    #[test]
    fn zero_duration_reports_are_ignored() {
        let player = BridgePlayer::new(KioskBroadcaster::new(4));
        player.note_duration(0.0);
        assert_eq!(player.duration(), None);
    }

    #[test]
    fn loading_a_new_item_forgets_the_old_duration() {
        let player = BridgePlayer::new(KioskBroadcaster::new(4));
        player.note_duration(300.0);
        player.load(&sample_video());
        assert_eq!(player.duration(), None);
    }

    #[test]
    fn destroy_forgets_the_duration() {
        let player = BridgePlayer::new(KioskBroadcaster::new(4));
        player.note_duration(300.0);
        player.destroy();
        assert_eq!(player.duration(), None);
    }
}

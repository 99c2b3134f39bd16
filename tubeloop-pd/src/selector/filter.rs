//! Eligibility filter pipeline
//!
//! Pure functions over candidate lists. Order matters: age, known duration,
//! not recently played, minimum views. The relaxed pass keeps only the age
//! filter and is the liveness fallback when the strict pipeline empties the
//! pool.

use tubeloop_common::config::KioskConfig;
use tubeloop_common::history::PlayHistory;
use tubeloop_common::model::Video;

/// Cutoffs derived once per selection request.
#[derive(Debug, Clone, Copy)]
pub struct FilterParams {
    /// Oldest acceptable publish timestamp, epoch ms
    pub max_age_cutoff_ms: i64,
    /// Plays at or after this timestamp exclude a video, epoch ms
    pub played_cutoff_ms: i64,
    /// Minimum view count; 0 disables the filter
    pub min_views: u64,
}

impl FilterParams {
    pub fn from_config(config: &KioskConfig, now_ms: i64) -> Self {
        Self {
            max_age_cutoff_ms: config.max_age_cutoff_ms(now_ms),
            played_cutoff_ms: config.played_cutoff_ms(now_ms),
            min_views: config.min_views,
        }
    }
}

/// Age filter: a video with no publish timestamp is dropped.
pub fn within_max_age(video: &Video, cutoff_ms: i64) -> bool {
    video.published.is_some_and(|ts| ts >= cutoff_ms)
}

/// Full strict pipeline.
pub fn eligible(videos: &[Video], params: &FilterParams, history: &PlayHistory) -> Vec<Video> {
    videos
        .iter()
        .filter(|v| within_max_age(v, params.max_age_cutoff_ms))
        .filter(|v| v.duration_seconds.is_some())
        .filter(|v| !history.played_within(&v.id, params.played_cutoff_ms))
        .filter(|v| {
            params.min_views == 0 || v.view_count.unwrap_or(0) >= params.min_views
        })
        .cloned()
        .collect()
}

/// Relaxed pass: age filter only.
pub fn age_only(videos: &[Video], cutoff_ms: i64) -> Vec<Video> {
    videos
        .iter()
        .filter(|v| within_max_age(v, cutoff_ms))
        .cloned()
        .collect()
}

/// Whether any of a channel's raw candidates appears in history at all.
/// Channels where this is false have entirely unseen content and get
/// priority in selection.
pub fn touched(videos: &[Video], history: &PlayHistory) -> bool {
    history.contains_any(videos.iter().map(|v| v.id.as_str()))
}

//! Kiosk configuration document
//!
//! `config.json` is read fresh on every selection request so an operator can
//! fix a broken configuration while the kiosk keeps retrying.

use crate::clock::{DAY_MS, YEAR_MS};
use crate::model::Channel;
use serde::{Deserialize, Serialize};

/// Selection configuration, persisted as `config.json`.
///
/// Every field has a default so a partial (or missing) document still yields
/// a usable configuration — except that an empty channel list is an error at
/// selection time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KioskConfig {
    /// Configured content channels (empty list is a configuration error)
    pub channels: Vec<Channel>,

    /// Maximum candidate age in years
    pub max_age_years: u32,

    /// Minimum view count (0 disables the filter)
    pub min_views: u64,

    /// Days after which a play no longer excludes a video
    pub played_reset_days: u32,

    /// Per-channel candidate cache time-to-live
    pub cache_ttl_minutes: u32,

    /// Maximum results requested per channel from the primary provider
    pub max_search_results: u32,

    /// Retained for documents written by earlier revisions; the aggregate
    /// relaxation pass does not count attempts
    pub attempts_before_relax: u32,

    /// Videos shorter than this are dropped at fetch time (Shorts exclusion)
    pub min_duration_seconds: u32,

    /// Program director listen port
    pub port: u16,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            max_age_years: 2,
            min_views: 0,
            played_reset_days: 60,
            cache_ttl_minutes: 15,
            max_search_results: 100,
            attempts_before_relax: 6,
            min_duration_seconds: 0,
            port: 5750,
        }
    }
}

impl KioskConfig {
    /// Oldest acceptable publish timestamp, epoch ms.
    pub fn max_age_cutoff_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.max_age_years as i64 * YEAR_MS
    }

    /// Plays at or after this timestamp still exclude a video.
    pub fn played_cutoff_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.played_reset_days as i64 * DAY_MS
    }

    /// Candidate cache time-to-live in milliseconds.
    pub fn cache_ttl_ms(&self) -> i64 {
        self.cache_ttl_minutes as i64 * 60_000
    }
}

/// API credentials, persisted as `credentials.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// YouTube Data API v3 key; empty means the API provider is unavailable
    #[serde(rename = "YOUTUBE_API_KEY", default)]
    pub youtube_api_key: String,
}

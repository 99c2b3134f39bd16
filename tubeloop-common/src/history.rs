//! Play history document
//!
//! Maps video id to the epoch-ms timestamp it was last played. Entries are
//! never purged here; anything older than the retention window simply stops
//! excluding its video from selection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Play history, persisted as `played.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayHistory(HashMap<String, i64>);

impl PlayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the play timestamp for a video. Idempotent: a second call
    /// just moves the timestamp forward.
    pub fn mark(&mut self, video_id: &str, now_ms: i64) {
        self.0.insert(video_id.to_string(), now_ms);
    }

    pub fn last_played(&self, video_id: &str) -> Option<i64> {
        self.0.get(video_id).copied()
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.0.contains_key(video_id)
    }

    /// True when the video was played at or after the cutoff.
    pub fn played_within(&self, video_id: &str, cutoff_ms: i64) -> bool {
        self.last_played(video_id)
            .is_some_and(|ts| ts >= cutoff_ms)
    }

    /// True when any of the given ids appears in history at all, however
    /// old the entry. Drives the unseen-channel bias.
    pub fn contains_any<'a>(&self, mut ids: impl Iterator<Item = &'a str>) -> bool {
        ids.any(|id| self.contains(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

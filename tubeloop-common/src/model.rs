//! Data model: channels, candidate videos, and the selection projection
//!
//! Field names follow the persisted JSON document schema (camelCase), which
//! is shared with the kiosk page and the admin API.

use serde::{Deserialize, Serialize};

/// A content channel (source) with a relative selection weight.
///
/// Configured externally in `config.json`; read-only to the selection
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel identifier (YouTube channel id)
    pub id: String,

    /// Display title; falls back to the id when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Relative selection weight, floored to a minimum of 1
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl Channel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            weight: 1,
        }
    }

    /// Weight used for the expanded selection space (never zero).
    pub fn effective_weight(&self) -> usize {
        self.weight.max(1) as usize
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// A candidate video as returned by a provider.
///
/// Immutable once fetched. Unknown metadata stays `None`; the filter
/// pipeline decides what to do with gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Owning channel id (may be absent in feed data)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    /// Publish timestamp, epoch milliseconds
    #[serde(default)]
    pub published: Option<i64>,

    #[serde(default)]
    pub duration_seconds: Option<u32>,

    #[serde(default)]
    pub view_count: Option<u64>,

    /// Whether the video may be embedded; `None` when unknown
    #[serde(default)]
    pub embeddable: Option<bool>,
}

/// Public projection of a chosen video, returned by `GET /api/next`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextVideo {
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub published: Option<i64>,
    pub duration_seconds: Option<u32>,
    pub view_count: Option<u64>,
    pub embeddable: Option<bool>,
}

impl NextVideo {
    /// Project a candidate, falling back to the configured channel id when
    /// the provider did not report one (RSS entries sometimes omit it).
    pub fn from_video(video: &Video, fallback_channel_id: &str) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            channel_id: video
                .channel_id
                .clone()
                .unwrap_or_else(|| fallback_channel_id.to_string()),
            published: video.published,
            duration_seconds: video.duration_seconds,
            view_count: video.view_count,
            embeddable: video.embeddable,
        }
    }
}

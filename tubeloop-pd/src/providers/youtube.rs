//! Primary provider: YouTube Data API v3
//!
//! Two-step fetch per channel: `search.list` for recent video ids, then
//! `videos.list` for the metadata the filter pipeline needs (publish time,
//! duration, view count, embeddable flag). Videos with unknown duration or
//! shorter than `minDurationSeconds` are dropped here (Shorts exclusion).

use crate::providers::{CandidateProvider, FetchOptions};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tubeloop_common::config::Credentials;
use tubeloop_common::model::Video;
use tubeloop_common::storage::{Store, CREDENTIALS_DOC};
use tubeloop_common::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

pub struct YouTubeApiProvider {
    http: reqwest::Client,
    store: Store,
    base_url: String,
}

impl YouTubeApiProvider {
    pub fn new(store: Store) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// API key is re-read per fetch so an operator can drop credentials in
    /// without a restart.
    fn api_key(&self) -> Result<String> {
        let creds: Credentials = self.store.read_or_default(CREDENTIALS_DOC);
        if creds.youtube_api_key.is_empty() {
            return Err(Error::Provider("no API key configured".to_string()));
        }
        Ok(creds.youtube_api_key)
    }

    async fn search_video_ids(
        &self,
        channel_id: &str,
        max_results: u32,
        key: &str,
    ) -> Result<Vec<String>> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("maxResults", &max_results.min(100).to_string()),
                ("order", "date"),
                ("type", "video"),
                ("key", key),
            ])
            .send()
            .await
            .map_err(|e| Error::Provider(format!("search.list request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "search.list failed: {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("search.list decode failed: {e}")))?;

        Ok(body
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    async fn video_details(&self, ids: &[String], key: &str) -> Result<Vec<Video>> {
        let url = format!("{}/videos", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet,contentDetails,statistics,status"),
                ("id", &ids.join(",")),
                ("key", key),
            ])
            .send()
            .await
            .map_err(|e| Error::Provider(format!("videos.list request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "videos.list failed: {}",
                response.status()
            )));
        }

        let body: VideosResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("videos.list decode failed: {e}")))?;

        Ok(body.items.into_iter().map(VideoItem::into_video).collect())
    }
}

#[async_trait]
impl CandidateProvider for YouTubeApiProvider {
    fn name(&self) -> &'static str {
        "youtube-api"
    }

    async fn fetch(&self, channel_id: &str, opts: &FetchOptions) -> Result<Vec<Video>> {
        let key = self.api_key()?;

        let ids = self
            .search_video_ids(channel_id, opts.max_results, &key)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let videos = self.video_details(&ids, &key).await?;

        // Shorts exclusion: unknown duration or below the configured floor
        let min_duration = opts.min_duration_seconds;
        let videos: Vec<Video> = videos
            .into_iter()
            .filter(|v| match v.duration_seconds {
                Some(d) => d >= min_duration,
                None => false,
            })
            .collect();

        debug!(
            channel = channel_id,
            count = videos.len(),
            "fetched channel videos via API"
        );
        Ok(videos)
    }
}

/// Parse an ISO-8601 duration (`PT1H2M3S`, `P1DT2H`, ...) into seconds.
///
/// Returns `None` for strings that carry no time designator at all.
pub fn iso8601_duration_seconds(iso: &str) -> Option<u32> {
    let rest = iso.strip_prefix('P')?;
    let mut seconds: u64 = 0;
    let mut digits = String::new();
    let mut in_time = false;
    let mut matched = false;

    for c in rest.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' => digits.push(c),
            'D' if !in_time => {
                seconds += digits.parse::<u64>().ok()? * 86_400;
                digits.clear();
                matched = true;
            }
            'H' if in_time => {
                seconds += digits.parse::<u64>().ok()? * 3_600;
                digits.clear();
                matched = true;
            }
            'M' if in_time => {
                seconds += digits.parse::<u64>().ok()? * 60;
                digits.clear();
                matched = true;
            }
            'S' if in_time => {
                seconds += digits.parse::<u64>().ok()?;
                digits.clear();
                matched = true;
            }
            // months/years in a video duration are not expected; bail
            _ => return None,
        }
    }

    if !matched {
        return None;
    }
    u32::try_from(seconds).ok()
}

// ============================================================================
// API response shapes (only the fields we consume)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Option<Snippet>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    statistics: Option<Statistics>,
    #[serde(default)]
    status: Option<VideoStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default)]
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoStatus {
    #[serde(default)]
    embeddable: Option<bool>,
}

impl VideoItem {
    fn into_video(self) -> Video {
        let snippet = self.snippet;
        let published = snippet
            .as_ref()
            .and_then(|s| s.published_at.as_deref())
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.timestamp_millis());
        Video {
            id: self.id,
            title: snippet.as_ref().map(|s| s.title.clone()).unwrap_or_default(),
            channel_id: snippet.and_then(|s| s.channel_id),
            published,
            duration_seconds: self
                .content_details
                .and_then(|c| c.duration)
                .and_then(|d| iso8601_duration_seconds(&d)),
            view_count: self
                .statistics
                .and_then(|s| s.view_count)
                .and_then(|v| v.parse().ok()),
            embeddable: self.status.and_then(|s| s.embeddable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso8601_durations() {
        assert_eq!(iso8601_duration_seconds("PT3M20S"), Some(200));
        assert_eq!(iso8601_duration_seconds("PT1H2M3S"), Some(3723));
        assert_eq!(iso8601_duration_seconds("PT45S"), Some(45));
        assert_eq!(iso8601_duration_seconds("PT2H"), Some(7200));
        assert_eq!(iso8601_duration_seconds("P1DT1S"), Some(86_401));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(iso8601_duration_seconds("3M20S"), None);
        assert_eq!(iso8601_duration_seconds("P"), None);
        assert_eq!(iso8601_duration_seconds("PT"), None);
        assert_eq!(iso8601_duration_seconds("P1Y"), None);
    }

    #[test]
    fn maps_video_item_fields() {
        let raw = r#"{
            "id": "vid1",
            "snippet": {
                "title": "A video",
                "publishedAt": "2024-05-01T12:00:00Z",
                "channelId": "UC1"
            },
            "contentDetails": { "duration": "PT10M" },
            "statistics": { "viewCount": "12345" },
            "status": { "embeddable": true }
        }"#;
        let item: VideoItem = serde_json::from_str(raw).unwrap();
        let video = item.into_video();
        assert_eq!(video.id, "vid1");
        assert_eq!(video.duration_seconds, Some(600));
        assert_eq!(video.view_count, Some(12345));
        assert_eq!(video.embeddable, Some(true));
        assert_eq!(video.channel_id.as_deref(), Some("UC1"));
        assert!(video.published.is_some());
    }

    #[test]
    fn missing_metadata_stays_unknown() {
        let raw = r#"{ "id": "vid2" }"#;
        let item: VideoItem = serde_json::from_str(raw).unwrap();
        let video = item.into_video();
        assert_eq!(video.duration_seconds, None);
        assert_eq!(video.view_count, None);
        assert_eq!(video.embeddable, None);
        assert_eq!(video.published, None);
    }
}

//! Secondary provider: YouTube channel Atom feed
//!
//! No API key required, but the feed only carries the latest ~15 entries
//! and knows nothing about duration, view count, or embeddability — those
//! stay `None` and the filter pipeline treats them accordingly.

use crate::providers::{CandidateProvider, FetchOptions};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tubeloop_common::model::Video;
use tubeloop_common::{Error, Result};

const DEFAULT_FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";

pub struct RssProvider {
    http: reqwest::Client,
    feed_url: String,
}

impl Default for RssProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RssProvider {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            feed_url: DEFAULT_FEED_URL.to_string(),
        }
    }

    /// Override the feed URL (tests point this at a local server).
    pub fn with_feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = feed_url.into();
        self
    }
}

#[async_trait]
impl CandidateProvider for RssProvider {
    fn name(&self) -> &'static str {
        "rss-feed"
    }

    async fn fetch(&self, channel_id: &str, _opts: &FetchOptions) -> Result<Vec<Video>> {
        let response = self
            .http
            .get(&self.feed_url)
            .query(&[("channel_id", channel_id)])
            .send()
            .await
            .map_err(|e| Error::Provider(format!("RSS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "RSS fetch failed: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Provider(format!("RSS body read failed: {e}")))?;

        let videos = parse_feed(&text)?;
        debug!(
            channel = channel_id,
            count = videos.len(),
            "fetched channel videos via RSS"
        );
        Ok(videos)
    }
}

/// Parse a YouTube channel Atom feed into candidate videos.
pub fn parse_feed(xml: &str) -> Result<Vec<Video>> {
    let feed: Feed = quick_xml::de::from_str(xml)
        .map_err(|e| Error::Provider(format!("RSS parse failed: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.video_id?;
            if id.is_empty() {
                return None;
            }
            Some(Video {
                id,
                title: entry.title.unwrap_or_default(),
                channel_id: entry.channel_id,
                published: entry
                    .published
                    .as_deref()
                    .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
                    .map(|dt| dt.timestamp_millis()),
                duration_seconds: None,
                view_count: None,
                embeddable: None,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

// quick-xml's serde layer matches element local names with the namespace
// prefix already stripped, so `yt:videoId` arrives as `videoId`.
#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
    #[serde(rename = "channelId", default)]
    channel_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    published: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns="http://www.w3.org/2005/Atom">
  <title>Channel uploads</title>
  <entry>
    <id>yt:video:abc123</id>
    <yt:videoId>abc123</yt:videoId>
    <yt:channelId>UC1</yt:channelId>
    <title>First upload</title>
    <published>2024-06-01T10:00:00+00:00</published>
  </entry>
  <entry>
    <id>yt:video:def456</id>
    <yt:videoId>def456</yt:videoId>
    <yt:channelId>UC1</yt:channelId>
    <title>Second upload</title>
    <published>2024-06-02T10:00:00+00:00</published>
  </entry>
</feed>"#;

    #[test]
    fn parses_feed_entries() {
        let videos = parse_feed(SAMPLE_FEED).unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "abc123");
        assert_eq!(videos[0].title, "First upload");
        assert_eq!(videos[0].channel_id.as_deref(), Some("UC1"));
        assert!(videos[0].published.is_some());
        // feed data carries no duration or stats
        assert_eq!(videos[0].duration_seconds, None);
        assert_eq!(videos[0].view_count, None);
        assert_eq!(videos[0].embeddable, None);
    }

    #[test]
    fn empty_feed_yields_no_videos() {
        let xml = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        let videos = parse_feed(xml).unwrap();
        assert!(videos.is_empty());
    }

    #[test]
    fn garbage_is_a_provider_error() {
        assert!(parse_feed("not xml at all <<<").is_err());
    }
}

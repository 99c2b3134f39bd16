//! HTTP client for the program director's selection API

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use tubeloop_common::model::NextVideo;
use tubeloop_common::{Error, Result};

/// Selection operations the orchestrator needs from the program director.
#[async_trait]
pub trait SelectionApi: Send + Sync {
    /// Ask for the next item to play. `Ok(None)` means the pool is empty
    /// right now (not an error; the caller retries later).
    async fn next_video(&self) -> Result<Option<NextVideo>>;

    /// Record that an item finished playing (or was skipped).
    async fn mark_played(&self, video_id: &str) -> Result<()>;
}

/// Talks to tubeloop-pd over HTTP.
pub struct PdClient {
    http: reqwest::Client,
    base_url: String,
}

impl PdClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl SelectionApi for PdClient {
    async fn next_video(&self) -> Result<Option<NextVideo>> {
        let url = format!("{}/api/next", self.base_url);
        debug!("requesting next video from {}", url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("next-video request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Empty pool, not a failure
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "program director returned {} for /api/next",
                response.status()
            )));
        }

        let video: NextVideo = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("invalid next-video response: {}", e)))?;
        Ok(Some(video))
    }

    async fn mark_played(&self, video_id: &str) -> Result<()> {
        let url = format!("{}/api/played", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "videoId": video_id }))
            .send()
            .await
            .map_err(|e| Error::Http(format!("played report failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "program director returned {} for /api/played",
                response.status()
            )));
        }
        Ok(())
    }
}

//! Candidate providers and the fallback chain
//!
//! A provider turns a channel id into a list of candidate videos, or fails.
//! The chain tries capability-identical providers in order (Data API first,
//! then the RSS feed); the stale cache fallback lives one level up in the
//! selection engine because it must not refresh the cache timestamp.

pub mod rss;
pub mod youtube;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use tubeloop_common::model::Video;
use tubeloop_common::{Error, Result};

pub use rss::RssProvider;
pub use youtube::YouTubeApiProvider;

/// Per-fetch options derived from the kiosk configuration.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Maximum results to request from the primary provider
    pub max_results: u32,
    /// Videos shorter than this are dropped at fetch time (0 disables)
    pub min_duration_seconds: u32,
}

/// A source of candidate videos for one channel.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn fetch(&self, channel_id: &str, opts: &FetchOptions) -> Result<Vec<Video>>;
}

/// Ordered fallback chain over candidate providers.
///
/// Stages are tried in sequence; a failing stage is logged at warn and the
/// next one is consulted. The error of the last stage is returned only when
/// every stage failed.
pub struct ProviderChain {
    stages: Vec<Arc<dyn CandidateProvider>>,
}

impl ProviderChain {
    pub fn new(stages: Vec<Arc<dyn CandidateProvider>>) -> Self {
        Self { stages }
    }

    pub async fn fetch(&self, channel_id: &str, opts: &FetchOptions) -> Result<Vec<Video>> {
        let mut last_err = Error::Provider("no providers configured".to_string());
        for stage in &self.stages {
            match stage.fetch(channel_id, opts).await {
                Ok(videos) => {
                    debug!(
                        provider = stage.name(),
                        channel = channel_id,
                        count = videos.len(),
                        "provider fetch succeeded"
                    );
                    return Ok(videos);
                }
                Err(e) => {
                    warn!(
                        provider = stage.name(),
                        channel = channel_id,
                        "provider fetch failed: {e}"
                    );
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        name: &'static str,
        videos: Option<Vec<Video>>,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn ok(name: &'static str, videos: Vec<Video>) -> Self {
            Self {
                name,
                videos: Some(videos),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                videos: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CandidateProvider for FixedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _channel_id: &str, _opts: &FetchOptions) -> Result<Vec<Video>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.videos
                .clone()
                .ok_or_else(|| Error::Provider(format!("{} down", self.name)))
        }
    }

    fn video(id: &str) -> Video {
        Video {
            id: id.into(),
            title: id.into(),
            channel_id: Some("UC1".into()),
            published: Some(0),
            duration_seconds: Some(60),
            view_count: None,
            embeddable: None,
        }
    }

    const OPTS: FetchOptions = FetchOptions {
        max_results: 10,
        min_duration_seconds: 0,
    };

    #[tokio::test]
    async fn first_healthy_stage_wins() {
        let primary = Arc::new(FixedProvider::ok("primary", vec![video("a")]));
        let secondary = Arc::new(FixedProvider::ok("secondary", vec![video("b")]));
        let chain = ProviderChain::new(vec![
            primary.clone() as Arc<dyn CandidateProvider>,
            secondary.clone(),
        ]);

        let videos = chain.fetch("UC1", &OPTS).await.unwrap();
        assert_eq!(videos[0].id, "a");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_through_to_secondary() {
        let primary = Arc::new(FixedProvider::failing("primary"));
        let secondary = Arc::new(FixedProvider::ok("secondary", vec![video("b")]));
        let chain = ProviderChain::new(vec![
            primary as Arc<dyn CandidateProvider>,
            secondary,
        ]);

        let videos = chain.fetch("UC1", &OPTS).await.unwrap();
        assert_eq!(videos[0].id, "b");
    }

    #[tokio::test]
    async fn all_stages_failing_is_an_error() {
        let chain = ProviderChain::new(vec![
            Arc::new(FixedProvider::failing("primary")) as Arc<dyn CandidateProvider>,
            Arc::new(FixedProvider::failing("secondary")),
        ]);
        let err = chain.fetch("UC1", &OPTS).await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}

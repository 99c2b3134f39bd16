//! Selection engine
//!
//! One `select_next` call aggregates candidates across all configured
//! channels (cache, then provider chain, then stale cache), runs the filter
//! pipeline, relaxes it globally when nothing survives, biases toward
//! channels whose content is entirely unseen, and draws one weighted-random
//! choice. Configuration and history are re-read per call so operator edits
//! take effect without a restart.

use crate::providers::{FetchOptions, ProviderChain};
use crate::selector::cache::CandidateCache;
use crate::selector::filter::{self, FilterParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tubeloop_common::clock::Clock;
use tubeloop_common::config::KioskConfig;
use tubeloop_common::history::PlayHistory;
use tubeloop_common::model::{Channel, NextVideo, Video};
use tubeloop_common::storage::{Store, CONFIG_DOC, HISTORY_DOC};
use tubeloop_common::{Error, Result};

/// A pool candidate tagged with its channel's weight and unseen flag.
struct PoolEntry {
    video: Video,
    channel_id: String,
    weight: usize,
    unseen_channel: bool,
}

pub struct SelectionEngine {
    store: Store,
    chain: ProviderChain,
    cache: CandidateCache,
    clock: Arc<dyn Clock>,
}

impl SelectionEngine {
    pub fn new(store: Store, chain: ProviderChain, clock: Arc<dyn Clock>) -> Self {
        let cache = CandidateCache::load(store.clone(), clock.clone());
        Self {
            store,
            chain,
            cache,
            clock,
        }
    }

    /// Select the next video to show.
    ///
    /// Errors only when no channels are configured; provider failures and
    /// empty catalogs degrade to `Ok(None)`.
    ///
    /// The RNG is owned rather than thread-local so the future stays `Send`
    /// and can run on an axum handler.
    pub async fn select_next(&self) -> Result<Option<NextVideo>> {
        self.select_next_with(&mut StdRng::from_entropy()).await
    }

    /// Same as [`select_next`](Self::select_next) with an explicit RNG,
    /// which the statistical tests use.
    pub async fn select_next_with<R: Rng>(&self, rng: &mut R) -> Result<Option<NextVideo>> {
        let config: KioskConfig = self.store.read_or_default(CONFIG_DOC);
        if config.channels.is_empty() {
            return Err(Error::NoChannels);
        }
        let history: PlayHistory = self.store.read_or_default(HISTORY_DOC);
        let now_ms = self.clock.now_ms();

        let per_channel = self.gather(&config).await;

        let params = FilterParams::from_config(&config, now_ms);
        let mut pool: Vec<PoolEntry> = Vec::new();
        for (channel, raw) in &per_channel {
            let unseen = !filter::touched(raw, &history);
            for video in filter::eligible(raw, &params, &history) {
                pool.push(PoolEntry {
                    video,
                    channel_id: channel.id.clone(),
                    weight: channel.effective_weight(),
                    unseen_channel: unseen,
                });
            }
        }

        // Liveness fallback: one relaxed pass keeping only the age filter.
        // Always fires when the strict pool is empty, never more than once.
        if pool.is_empty() {
            debug!("strict pool empty, relaxing filters to age only");
            for (channel, raw) in &per_channel {
                let unseen = !filter::touched(raw, &history);
                for video in filter::age_only(raw, params.max_age_cutoff_ms) {
                    pool.push(PoolEntry {
                        video,
                        channel_id: channel.id.clone(),
                        weight: channel.effective_weight(),
                        unseen_channel: unseen,
                    });
                }
            }
        }

        if pool.is_empty() {
            info!("no eligible video across {} channels", config.channels.len());
            return Ok(None);
        }

        // Discovery bias: when any candidate comes from a channel with no
        // history presence at all, restrict the pool to those channels.
        if pool.iter().any(|e| e.unseen_channel) {
            pool.retain(|e| e.unseen_channel);
        }

        let chosen = weighted_pick(&pool, rng);
        info!(
            video = %chosen.video.id,
            channel = %chosen.channel_id,
            "selected next video"
        );
        Ok(Some(NextVideo::from_video(&chosen.video, &chosen.channel_id)))
    }

    /// Record that a video was played, persisted immediately. Idempotent.
    pub async fn record_played(&self, video_id: &str) -> Result<()> {
        let mut history: PlayHistory = self.store.read_or_default(HISTORY_DOC);
        history.mark(video_id, self.clock.now_ms());
        self.store.write(HISTORY_DOC, &history)?;
        debug!(video = video_id, "marked played");
        Ok(())
    }

    /// Obtain every channel's candidate list: fresh cache, else provider
    /// chain (recording the result), else stale cache untouched so the next
    /// call retries the chain.
    async fn gather(&self, config: &KioskConfig) -> Vec<(Channel, Vec<Video>)> {
        let opts = FetchOptions {
            max_results: config.max_search_results,
            min_duration_seconds: config.min_duration_seconds,
        };
        let ttl_ms = config.cache_ttl_ms();

        let mut per_channel = Vec::with_capacity(config.channels.len());
        for channel in &config.channels {
            let videos = match self.cache.fresh(&channel.id, ttl_ms).await {
                Some(videos) => videos,
                None => match self.chain.fetch(&channel.id, &opts).await {
                    Ok(videos) => {
                        self.cache.update(&channel.id, videos.clone()).await;
                        videos
                    }
                    Err(e) => {
                        warn!(
                            channel = %channel.id,
                            "all providers failed, serving stale cache: {e}"
                        );
                        self.cache.stale(&channel.id).await
                    }
                },
            };
            per_channel.push((channel.clone(), videos));
        }
        per_channel
    }
}

/// Uniform draw from the weight-expanded selection space: each candidate
/// appears `weight` times.
fn weighted_pick<'a, R: Rng>(pool: &'a [PoolEntry], rng: &mut R) -> &'a PoolEntry {
    let mut expanded = Vec::new();
    for (index, entry) in pool.iter().enumerate() {
        for _ in 0..entry.weight.max(1) {
            expanded.push(index);
        }
    }
    &pool[expanded[rng.gen_range(0..expanded.len())]]
}

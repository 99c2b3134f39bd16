//! Per-channel candidate cache
//!
//! Bounds provider call volume against API quota limits. Entries live in
//! memory and are mirrored to `channelCache.json` so a restart does not
//! start from a cold cache. When the provider chain fails, the stale entry
//! is served without touching its timestamp, so the next selection attempt
//! retries the chain instead of sitting on stale data for another TTL.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use tubeloop_common::clock::Clock;
use tubeloop_common::model::Video;
use tubeloop_common::storage::{Store, CACHE_DOC};

/// One channel's cached candidate list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// When the list was fetched, epoch ms
    pub last_fetch: i64,
    pub videos: Vec<Video>,
}

pub struct CandidateCache {
    store: Store,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CandidateCache {
    /// Load the cache document from disk (missing or corrupt reads as empty).
    pub fn load(store: Store, clock: Arc<dyn Clock>) -> Self {
        let entries: HashMap<String, CacheEntry> = store.read_or_default(CACHE_DOC);
        debug!(channels = entries.len(), "loaded candidate cache");
        Self {
            store,
            clock,
            entries: RwLock::new(entries),
        }
    }

    /// The cached list for a channel when its age is below the TTL.
    pub async fn fresh(&self, channel_id: &str, ttl_ms: i64) -> Option<Vec<Video>> {
        let entries = self.entries.read().await;
        let entry = entries.get(channel_id)?;
        let age = self.clock.now_ms() - entry.last_fetch;
        if age < ttl_ms {
            Some(entry.videos.clone())
        } else {
            None
        }
    }

    /// Whatever is cached for a channel, however old (possibly empty).
    /// Does not refresh the entry's timestamp.
    pub async fn stale(&self, channel_id: &str) -> Vec<Video> {
        let entries = self.entries.read().await;
        entries
            .get(channel_id)
            .map(|e| e.videos.clone())
            .unwrap_or_default()
    }

    /// Record a freshly fetched list and persist the document best-effort.
    pub async fn update(&self, channel_id: &str, videos: Vec<Video>) {
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.insert(
                channel_id.to_string(),
                CacheEntry {
                    last_fetch: self.clock.now_ms(),
                    videos,
                },
            );
            entries.clone()
        };
        if let Err(e) = self.store.write(CACHE_DOC, &snapshot) {
            warn!("failed to persist candidate cache: {e}");
        }
    }
}

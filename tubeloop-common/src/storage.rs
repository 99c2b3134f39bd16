//! Atomic JSON document store
//!
//! All persisted state (configuration, play history, candidate cache,
//! credentials) lives as JSON documents in one data directory. Writes go to
//! a temp file first and are moved into place with `rename`, so a crash
//! never leaves a truncated document behind.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Selection configuration document name
pub const CONFIG_DOC: &str = "config.json";
/// Play history document name
pub const HISTORY_DOC: &str = "played.json";
/// Per-channel candidate cache document name
pub const CACHE_DOC: &str = "channelCache.json";
/// API credentials document name
pub const CREDENTIALS_DOC: &str = "credentials.json";

/// Document store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open a store, creating the data directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, doc: &str) -> PathBuf {
        self.root.join(doc)
    }

    /// Read a document, returning `None` when it does not exist.
    pub fn read<T: DeserializeOwned>(&self, doc: &str) -> Result<Option<T>> {
        let path = self.path(doc);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Read a document, falling back to its default when missing or
    /// unparseable. A corrupt document is logged and treated as absent
    /// rather than taking the kiosk down.
    pub fn read_or_default<T: DeserializeOwned + Default>(&self, doc: &str) -> T {
        match self.read(doc) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(document = doc, "failed to read document, using default: {e}");
                T::default()
            }
        }
    }

    /// Write a document atomically: serialize to `<name>.tmp`, then rename
    /// over the target.
    pub fn write<T: Serialize>(&self, doc: &str, value: &T) -> Result<()> {
        let path = self.path(doc);
        let tmp = self.root.join(format!("{doc}.tmp"));
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Default data directory when neither the CLI argument nor the environment
/// provides one.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tubeloop"))
        .unwrap_or_else(|| PathBuf::from("./tubeloop_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KioskConfig;
    use crate::history::PlayHistory;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut history = PlayHistory::new();
        history.mark("abc", 42);
        store.write(HISTORY_DOC, &history).unwrap();

        let loaded: PlayHistory = store.read(HISTORY_DOC).unwrap().unwrap();
        assert_eq!(loaded, history);
        // no temp file left behind
        assert!(!store.path("played.json.tmp").exists());
    }

    #[test]
    fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let loaded: Option<PlayHistory> = store.read(HISTORY_DOC).unwrap();
        assert!(loaded.is_none());
        let defaulted: KioskConfig = store.read_or_default(CONFIG_DOC);
        assert_eq!(defaulted.max_age_years, 2);
    }

    #[test]
    fn corrupt_document_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        std::fs::write(store.path(CONFIG_DOC), "{not json").unwrap();
        let cfg: KioskConfig = store.read_or_default(CONFIG_DOC);
        assert!(cfg.channels.is_empty());
    }
}

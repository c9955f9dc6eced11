//! On-disk catalog snapshots
//!
//! ```text
//! {data_dir}/
//!   raw_events.json   events as fetched, after the recency filter
//!   events.json       normalized events
//!   index.bin         persisted semantic index
//! ```
//!
//! Files are written to a temporary sibling then renamed, so a reader never
//! sees a half-written snapshot.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::error::CatalogResult;
use crate::catalog::types::{NormalizedEvent, RawEvent};

const RAW_EVENTS_FILE: &str = "raw_events.json";
const EVENTS_FILE: &str = "events.json";
const INDEX_FILE: &str = "index.bin";

/// Paths and helpers for the catalog's data directory
#[derive(Debug, Clone)]
pub struct CatalogStore {
    data_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn raw_events_path(&self) -> PathBuf {
        self.data_dir.join(RAW_EVENTS_FILE)
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(EVENTS_FILE)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE)
    }

    pub fn save_raw_events(&self, events: &[RawEvent]) -> CatalogResult<()> {
        self.write_json(&self.raw_events_path(), events)?;
        tracing::info!("Saved {} raw events to {:?}", events.len(), self.raw_events_path());
        Ok(())
    }

    pub fn save_events(&self, events: &[NormalizedEvent]) -> CatalogResult<()> {
        self.write_json(&self.events_path(), events)?;
        tracing::info!("Saved {} normalized events to {:?}", events.len(), self.events_path());
        Ok(())
    }

    pub fn load_events(&self) -> CatalogResult<Vec<NormalizedEvent>> {
        read_json(&self.events_path())
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> CatalogResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(path, &bytes)
    }
}

/// Write `bytes` to `path` through a temporary file and a rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> CatalogResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> CatalogResult<T> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::normalizer::TimingNormalizer;
    use crate::time::Clock;
    use tempfile::tempdir;

    #[test]
    fn test_events_snapshot() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("nested"));

        let raw = vec![RawEvent::default()];
        let events = TimingNormalizer::new(Clock::utc(), "fr")
            .normalize_all(&raw, Clock::utc().now());

        store.save_raw_events(&raw).unwrap();
        store.save_events(&events).unwrap();

        assert!(store.raw_events_path().exists());
        assert_eq!(store.load_events().unwrap(), events);
        assert!(!store.events_path().with_extension("tmp").exists());
    }

    #[test]
    fn test_load_missing_snapshot() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        assert!(store.load_events().is_err());
    }
}

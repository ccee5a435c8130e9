//! Local-only JSON cache for per-user gamification singletons.
//!
//! Streak and weekly-challenge state live exclusively here, keyed
//! `"{feature}_{user_id}"`, one JSON file per key. This is deliberately not a
//! remote store: these records are rewritten at most once per page load and
//! pay no round trip. A corrupted file is logged and treated as absent.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {:?}", dir))?;
        Ok(Self { dir })
    }

    fn path(&self, feature: &str, user_id: usize) -> PathBuf {
        self.dir.join(format!("{}_{}.json", feature, user_id))
    }

    /// Loads a cached value. Missing and corrupted entries both come back as
    /// None; corruption is logged, the caller falls back to default state.
    pub fn get<T: DeserializeOwned>(&self, feature: &str, user_id: usize) -> Option<T> {
        let path = self.path(feature, user_id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache entry {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Corrupted cache entry {:?}, falling back to defaults: {}", path, e);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, feature: &str, user_id: usize, value: &T) -> Result<()> {
        let path = self.path(feature, user_id);
        let raw = serde_json::to_string(value)?;
        std::fs::write(&path, raw)
            .with_context(|| format!("Failed to write cache entry {:?}", path))
    }
}

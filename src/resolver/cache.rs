use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{digest_file, ResolvedArtifact};

/// File name of the resolution index inside the cache directory
pub const CACHE_INDEX_FILE: &str = "resolutions.json";

/// One cached resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub artifact: ResolvedArtifact,
    /// Seconds since the Unix epoch
    pub resolved_at: u64,
}

impl CacheEntry {
    pub fn new(artifact: ResolvedArtifact, resolved_at: SystemTime) -> Self {
        Self {
            artifact,
            resolved_at: to_epoch_secs(resolved_at),
        }
    }

    /// Time elapsed since the resolution; zero when the clock went backwards
    pub fn age(&self, now: SystemTime) -> Duration {
        Duration::from_secs(to_epoch_secs(now).saturating_sub(self.resolved_at))
    }

    /// Freshness predicate: strictly younger than the window
    pub fn is_fresh(&self, now: SystemTime, window: Duration) -> bool {
        self.age(now) < window
    }

    /// The cached file still exists and still has the recorded digest
    pub fn is_intact(&self) -> bool {
        match digest_file(&self.artifact.path) {
            Ok(digest) => digest == self.artifact.sha256,
            Err(_) => false,
        }
    }
}

fn to_epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: BTreeMap<String, CacheEntry>,
}

/// Coordinate-keyed resolution cache, optionally persisted as JSON
#[derive(Debug, Default)]
pub struct ResolutionCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CacheEntry>,
}

impl ResolutionCache {
    /// A cache that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the index from `dir`, starting empty when it is missing or unreadable
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CACHE_INDEX_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheFile>(&content) {
                Ok(file) => file.entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt cache index {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Cannot read cache index {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the index back to disk (no-op for in-memory caches)
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CacheFile {
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let partial = path.with_extension("json.part");
        fs::write(&partial, json)?;
        fs::rename(&partial, path)
    }
}

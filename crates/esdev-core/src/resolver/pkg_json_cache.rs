//! Parsed package.json cache.
//!
//! The dev server resolves the same packages over and over, so parsed
//! manifests are memoized per path. Entries carry an mtime/size stamp and are
//! re-read when the file changes underneath the server.

use rustc_hash::FxHashMap as HashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// File stamp for cache invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgJsonStamp {
    /// Modification time in milliseconds since epoch.
    pub mtime_ms: Option<u64>,
    /// File size in bytes.
    pub size: Option<u64>,
}

impl PkgJsonStamp {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_path(path: &Path) -> Option<Self> {
        let meta = path.metadata().ok()?;
        let mtime_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64);
        Some(Self {
            mtime_ms,
            size: Some(meta.len()),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedPkgJson {
    /// `None` records a manifest that failed to parse.
    value: Option<Arc<Value>>,
    stamp: PkgJsonStamp,
}

/// Thread-safe cache of parsed package.json files.
#[derive(Debug, Default)]
pub struct PkgJsonCache {
    entries: RwLock<HashMap<PathBuf, CachedPkgJson>>,
}

impl PkgJsonCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` as JSON, serving from the cache while the stamp matches.
    ///
    /// Missing or malformed manifests yield `None`.
    pub fn read(&self, path: &Path) -> Option<Arc<Value>> {
        let stamp = PkgJsonStamp::from_path(path)?;

        if let Ok(entries) = self.entries.read() {
            if let Some(cached) = entries.get(path) {
                if cached.stamp == stamp {
                    return cached.value.clone();
                }
                debug!(path = %path.display(), "package.json changed, re-reading");
            }
        }

        let value = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<Value>(&s).ok())
            .map(Arc::new);
        if value.is_none() {
            debug!(path = %path.display(), "ignoring unreadable package.json");
        }

        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                path.to_path_buf(),
                CachedPkgJson {
                    value: value.clone(),
                    stamp,
                },
            );
        }

        value
    }

    /// Number of cached manifests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

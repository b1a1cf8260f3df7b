//! Content-hash manifest for hash-based staleness.
//!
//! Stored as `manifest.json` in the `dependencies-cache` directory. It maps
//! each `.dep` entry (by its path relative to that directory) to the content
//! hash its source artifact had when the entry was written.

use std::collections::BTreeMap;
use std::path::Path;

use parcel_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the manifest file within the cache directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Version of the manifest layout. Manifests with another version are ignored.
pub const MANIFEST_VERSION: u32 = 1;

/// Source-artifact hashes recorded per cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashManifest {
    /// Layout version that produced this manifest.
    pub version: u32,

    /// Entry key (`<relation>/<key>.dep`) to source hash.
    pub entries: BTreeMap<String, ContentHash>,
}

impl Default for HashManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl HashManifest {
    /// Reads the manifest from `cache_dir`.
    pub fn read(cache_dir: &Path) -> Result<Self, CacheError> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content =
            std::fs::read_to_string(&path).map_err(|e| CacheError::Io { path, source: e })?;
        let manifest: Self =
            serde_json::from_str(&content).map_err(|e| CacheError::ManifestParse {
                reason: e.to_string(),
            })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(CacheError::ManifestParse {
                reason: format!("unsupported manifest version {}", manifest.version),
            });
        }
        Ok(manifest)
    }

    /// Loads the manifest, or returns an empty one if it is missing, corrupt,
    /// or from another layout version.
    pub fn load(cache_dir: &Path) -> Self {
        Self::read(cache_dir).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "starting with an empty hash manifest");
            Self::default()
        })
    }

    /// Writes the manifest to `cache_dir`, creating the directory if needed.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// The recorded hash for `entry`, if any.
    pub fn get(&self, entry: &str) -> Option<ContentHash> {
        self.entries.get(entry).copied()
    }

    /// Records `hash` for `entry`, replacing any previous value.
    pub fn insert(&mut self, entry: String, hash: ContentHash) {
        self.entries.insert(entry, hash);
    }
}

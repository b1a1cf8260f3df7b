//! Policies for deciding whether a cached result is out of date.

use serde::{Deserialize, Serialize};

/// How the dependency cache decides that an entry no longer matches its source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Staleness {
    /// Stale when the source was modified after the cache entry
    /// (`source.mtime > entry.mtime`). Equal timestamps count as fresh.
    #[default]
    #[serde(rename = "mtime")]
    ModifiedTime,
    /// Stale when the source's content hash differs from the hash recorded
    /// when the entry was written.
    ContentHash,
}

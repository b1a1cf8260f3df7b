//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing cache entries.
///
/// None of these reach the resolver: read errors become cache misses and
/// write errors are logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a cache file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A `.dep` file contained a line that is not a plausible path.
    #[error("unparseable cache entry {path} at line {line}: {reason}")]
    Parse {
        /// The `.dep` file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The entry is older than the artifact it describes.
    #[error("stale cache entry {path}")]
    Stale {
        /// The `.dep` file.
        path: PathBuf,
    },

    /// The target has no cache key.
    #[error("{target} cannot be cached: {reason}")]
    Unkeyable {
        /// The target.
        target: PathBuf,
        /// Why no key could be formed.
        reason: &'static str,
    },

    /// A dependency path cannot be written as a `.dep` line.
    #[error("cannot record {path} in a cache entry: {reason}")]
    Unrepresentable {
        /// The dependency path.
        path: PathBuf,
        /// What the format cannot hold.
        reason: &'static str,
    },

    /// The entry lists a dependency that no longer exists.
    #[error("cache entry {entry} lists missing {dependency}")]
    MissingDependency {
        /// The `.dep` file.
        entry: PathBuf,
        /// The dependency that is gone.
        dependency: PathBuf,
    },

    /// The hash manifest could not be parsed.
    #[error("failed to parse cache manifest: {reason}")]
    ManifestParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The hash manifest could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

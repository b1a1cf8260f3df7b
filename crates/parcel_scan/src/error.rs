//! Error types for filesystem scanning.

use std::path::PathBuf;

/// Errors raised by the scanning helpers.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A file that must exist was not found.
    #[error("file not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// No file with the requested name exists under the search directory.
    #[error("did not find file '{name}' in directory {dir}")]
    MissingFile {
        /// The requested file name.
        name: String,
        /// The directory that was searched.
        dir: PathBuf,
    },

    /// An I/O error occurred while reading file metadata.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

//! Errors raised while reading `parcel.toml`.

use std::path::PathBuf;

/// Why a `parcel.toml` could not be turned into a [`ParcelConfig`](crate::ParcelConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected tables.
    #[error("invalid parcel.toml: {reason}")]
    Parse {
        /// The deserializer's message.
        reason: String,
    },

    /// A `[roots]` entry is present but empty.
    #[error("roots.{root} is set to an empty path; omit it to disable that root")]
    EmptyRoot {
        /// `units`, `archives` or `cache`.
        root: &'static str,
    },

    /// `package.output_dir` is empty.
    #[error("package.output_dir must not be empty")]
    EmptyOutputDir,

    /// An entry of `package.platform_prefixes` is empty, which would match
    /// every archive.
    #[error("package.platform_prefixes[{index}] is empty and would exclude every archive")]
    EmptyPlatformPrefix {
        /// Position of the entry in the list.
        index: usize,
    },
}

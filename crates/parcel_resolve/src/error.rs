//! Error types for dependency analysis and resolution.

use std::path::PathBuf;

use parcel_common::{Relation, TargetPath};

/// A direct-dependency lookup failed for one target.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The target (or a file it needs) could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The target is not a well-formed class file.
    #[error("malformed class file {path}: {reason}")]
    Malformed {
        /// The offending file (for archive members, `archive!member`).
        path: PathBuf,
        /// Description of the format problem.
        reason: String,
    },

    /// An external extractor reported a failure.
    #[error("{0}")]
    External(String),
}

/// Errors surfaced by resolver construction and queries.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A configured root directory does not exist.
    #[error("{root} root does not exist: {path}")]
    RootNotFound {
        /// Which root (`"units"` or `"archives"`).
        root: &'static str,
        /// The configured path.
        path: PathBuf,
    },

    /// A query named a target that was never declared in the relation.
    #[error("unknown target in {relation} relation: {target}")]
    UnknownTarget {
        /// The relation that was queried.
        relation: Relation,
        /// The undeclared target.
        target: TargetPath,
    },

    /// Direct-dependency analysis failed for a target during construction.
    #[error("could not analyze {target} ({relation}): {source}")]
    Analysis {
        /// The relation being populated.
        relation: Relation,
        /// The target whose analysis failed.
        target: TargetPath,
        /// The extractor's error.
        source: AnalysisError,
    },

    /// Construction was cancelled through a [`CancelFlag`](crate::CancelFlag).
    #[error("dependency analysis cancelled")]
    Cancelled,
}

impl ResolveError {
    /// The target this error is about, if any.
    pub fn target(&self) -> Option<&TargetPath> {
        match self {
            ResolveError::UnknownTarget { target, .. } | ResolveError::Analysis { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }
}

//! Error types for packaging.

use std::path::PathBuf;

use parcel_resolve::ResolveError;
use parcel_scan::ScanError;

use crate::boundary::BoundaryError;

/// Errors that abort packaging of one component.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// Dependency resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Packaging needs a units root, but none is configured.
    #[error("no units root configured")]
    NoUnitsRoot,

    /// The component declares archives, but no archives root is configured.
    #[error("{component} declares archive dependencies but no archives root is configured")]
    NoArchivesRoot {
        /// The component's class name.
        component: String,
    },

    /// A file the component declares could not be found.
    #[error("{component} declares '{name}', which is not under {dir}")]
    MissingDeclaredFile {
        /// The component (or applet) class name.
        component: String,
        /// The declared file name.
        name: String,
        /// The directory that was searched.
        dir: PathBuf,
    },

    /// Scanning for declared files failed.
    #[error(transparent)]
    Scan(ScanError),

    /// An I/O error occurred while preparing the output directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The archive writer failed.
    #[error("could not write {archive}: {source}")]
    Write {
        /// The archive being written; it has been removed.
        archive: PathBuf,
        /// The writer's error.
        source: BoundaryError,
    },

    /// The uploader failed.
    #[error("could not upload {component}: {source}")]
    Upload {
        /// The component's class name.
        component: String,
        /// The uploader's error.
        source: BoundaryError,
    },
}

impl PackageError {
    pub(crate) fn from_scan(component: &str, err: ScanError) -> Self {
        match err {
            ScanError::MissingFile { name, dir } => PackageError::MissingDeclaredFile {
                component: component.to_string(),
                name,
                dir,
            },
            other => PackageError::Scan(other),
        }
    }
}

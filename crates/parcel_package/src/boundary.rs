//! Archive encoding and upload, implemented outside this crate.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::descriptor::ComponentDescriptor;

/// Error type returned by boundary implementations.
pub type BoundaryError = Box<dyn std::error::Error + Send + Sync>;

/// One file to place in an archive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveEntry {
    /// Entry name inside the archive, `/`-separated (`org/example/A.class`).
    pub name: String,
    /// The file on disk.
    pub source: PathBuf,
}

/// Writes archive files.
pub trait ArchiveWriter {
    /// Creates (or replaces) `archive` with the given manifest attributes and
    /// entries.
    fn write_archive(
        &self,
        archive: &Path,
        manifest: &[(&str, &str)],
        entries: &[ArchiveEntry],
    ) -> Result<(), BoundaryError>;
}

/// Publishes a packaged component.
pub trait Uploader {
    /// Uploads `component` together with every file in `files`.
    fn upload(
        &self,
        component: &ComponentDescriptor,
        files: &BTreeSet<PathBuf>,
    ) -> Result<(), BoundaryError>;
}

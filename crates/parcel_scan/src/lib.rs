//! Filesystem traversal and staleness checks.
//!
//! Provides breadth-first snapshots of directory trees (used to enumerate every
//! unit and archive under the configured roots), lookup of files by name, and
//! the modification-time staleness rule used by the dependency cache.

#![warn(missing_docs)]

pub mod error;
pub mod find;
pub mod stale;
pub mod tree;

pub use error::ScanError;
pub use find::{find_file_in_directory, find_files_in_directory};
pub use stale::is_file_stale;
pub use tree::{DirectoryTree, FileTree};

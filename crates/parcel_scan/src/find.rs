//! Locating files by name inside a directory tree.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::tree::FileTree;

/// Finds the first file (in breadth-first order) under `dir` whose path ends
/// with `name`.
///
/// `name` is matched component-wise, so `"lib1.jar"` matches `ext/lib1.jar`
/// but not `mylib1.jar`, and `"ext/lib1.jar"` pins the parent directory.
pub fn find_file_in_directory(name: &str, dir: &Path) -> Option<PathBuf> {
    FileTree::new(dir).find(|candidate| candidate.ends_with(name))
}

/// Finds one file for each of `names` under `dir`.
///
/// Fails with [`ScanError::MissingFile`] naming the first name (in sorted
/// order) that has no match.
pub fn find_files_in_directory<'a>(
    names: impl IntoIterator<Item = &'a str>,
    dir: &Path,
) -> Result<BTreeSet<PathBuf>, ScanError> {
    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_unstable();
    names
        .into_iter()
        .map(|name| {
            find_file_in_directory(name, dir).ok_or_else(|| ScanError::MissingFile {
                name: name.to_string(),
                dir: dir.to_path_buf(),
            })
        })
        .collect()
}

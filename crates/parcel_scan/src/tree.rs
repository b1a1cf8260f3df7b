//! Breadth-first snapshots of directory trees.
//!
//! Both iterators are computed eagerly when constructed: they are finite,
//! cloneable (and therefore restartable) snapshots, not live views of the
//! filesystem. Entries of one directory are visited in file-name order.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Every directory under a root, root first, breadth-first.
///
/// A root that does not exist (or is not a directory) yields nothing.
/// Directories reached a second time through a symlink are not descended
/// again, so symlink cycles terminate.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    dirs: VecDeque<PathBuf>,
}

impl DirectoryTree {
    /// Snapshots the directory tree rooted at `root`.
    pub fn new(root: &Path) -> Self {
        let mut dirs = VecDeque::new();
        if !root.is_dir() {
            return Self { dirs };
        }

        let mut visited = HashSet::new();
        let mut pending = VecDeque::new();
        if let Ok(canonical) = root.canonicalize() {
            visited.insert(canonical);
        }
        pending.push_back(root.to_path_buf());
        dirs.push_back(root.to_path_buf());

        while let Some(dir) = pending.pop_front() {
            for child in sorted_entries(&dir) {
                if !child.is_dir() {
                    continue;
                }
                let Ok(canonical) = child.canonicalize() else {
                    continue;
                };
                if !visited.insert(canonical) {
                    debug!(dir = %child.display(), "skipping directory already visited");
                    continue;
                }
                pending.push_back(child.clone());
                dirs.push_back(child);
            }
        }

        Self { dirs }
    }

    /// Number of directories remaining.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Returns `true` if no directories remain.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

impl Iterator for DirectoryTree {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        self.dirs.pop_front()
    }
}

/// Every regular file under a root, breadth-first.
///
/// All files at depth `n` are yielded before any file at depth `n + 1`.
/// Directories themselves are never yielded.
#[derive(Debug, Clone)]
pub struct FileTree {
    files: VecDeque<PathBuf>,
}

impl FileTree {
    /// Snapshots the regular files under `root`.
    pub fn new(root: &Path) -> Self {
        let files = DirectoryTree::new(root)
            .flat_map(|dir| sorted_entries(&dir).into_iter().filter(|p| p.is_file()))
            .collect();
        Self { files }
    }

    /// Number of files remaining.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files remain.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Iterator for FileTree {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        self.files.pop_front()
    }
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "unreadable directory");
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn names(paths: impl Iterator<Item = PathBuf>, root: &Path) -> Vec<String> {
        paths
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn files_breadth_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a/b/Deep.class"));
        touch(&root.join("a/Mid.class"));
        touch(&root.join("Top.class"));
        touch(&root.join("z/Other.class"));

        let found = names(FileTree::new(root), root);
        assert_eq!(
            found,
            vec!["Top.class", "a/Mid.class", "z/Other.class", "a/b/Deep.class"]
        );
    }

    #[test]
    fn directories_root_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a/b/X.class"));
        touch(&root.join("c/Y.class"));

        let found = names(DirectoryTree::new(root), root);
        assert_eq!(found, vec!["", "a", "c", "a/b"]);
    }

    #[test]
    fn missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(DirectoryTree::new(&missing).is_empty());
        assert!(FileTree::new(&missing).is_empty());
    }

    #[test]
    fn empty_root_has_no_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("empty/nested")).unwrap();
        assert_eq!(FileTree::new(dir.path()).count(), 0);
    }

    #[test]
    fn snapshot_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("A.class"));
        touch(&dir.path().join("p/B.class"));
        let tree = FileTree::new(dir.path());
        let first: Vec<_> = tree.clone().collect();
        let second: Vec<_> = tree.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn snapshot_is_not_live() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("A.class"));
        let tree = FileTree::new(dir.path());
        touch(&dir.path().join("B.class"));
        assert_eq!(tree.count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("pkg/A.class"));
        std::os::unix::fs::symlink(root, root.join("pkg/loop")).unwrap();

        let files: Vec<_> = FileTree::new(root).collect();
        assert_eq!(files.len(), 1);
    }
}

//! Canonical target identity.
//!
//! Every path used as a relation key or cache key goes through
//! [`TargetPath::new`], so two spellings of the same file (relative vs.
//! absolute, through a symlink, with `..` segments) always compare equal.

use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// The canonical, absolute path of a unit or archive.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetPath(PathBuf);

impl TargetPath {
    /// Resolves `path` to its canonical absolute form.
    ///
    /// Existing paths are canonicalized by the filesystem (symlinks and
    /// relative segments resolved). For a path that does not exist, the
    /// longest existing ancestor is canonicalized and the remaining
    /// components are appended after lexical normalization, so a missing
    /// file still gets a stable identity.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(canonical_form(path.as_ref()))
    }

    /// Returns the canonical path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns the final component as UTF-8, if it has one.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|n| n.to_str())
    }

    /// Returns this path relative to `root`, if it lies under it.
    pub fn relative_to(&self, root: &Path) -> Option<&Path> {
        self.0.strip_prefix(root).ok()
    }

    /// Consumes the identity, returning the owned path.
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for TargetPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<&Path> for TargetPath {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for TargetPath {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl fmt::Debug for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetPath({})", self.0.display())
    }
}

fn canonical_form(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = lexical_normalize(&make_absolute(path));
    let mut suffix: Vec<OsString> = Vec::new();
    let mut cursor = absolute.as_path();
    while let Some(parent) = cursor.parent() {
        if let Some(name) = cursor.file_name() {
            suffix.push(name.to_os_string());
        }
        if let Ok(mut base) = parent.canonicalize() {
            for part in suffix.iter().rev() {
                base.push(part);
            }
            return base;
        }
        cursor = parent;
    }
    absolute
}

fn make_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

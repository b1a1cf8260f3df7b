//! Conventions mapping compiled units and archives to files.
//!
//! A unit's fully-qualified name is encoded by its location under the units
//! root: `org/example/Main.class` is the unit `org.example.Main`.

use std::path::{Path, PathBuf};

/// File extension of compiled units.
pub const UNIT_EXTENSION: &str = "class";

/// File extension of archives.
pub const ARCHIVE_EXTENSION: &str = "jar";

/// Returns `true` if the path names a compiled unit.
pub fn is_unit(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == UNIT_EXTENSION)
}

/// Returns `true` if the path names an archive (extension compared case-insensitively).
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

/// Returns the file a unit named `unit_name` would occupy under `units_root`.
///
/// Does not check that the file exists.
pub fn unit_path(unit_name: &str, units_root: &Path) -> PathBuf {
    let mut path = units_root.to_path_buf();
    for segment in unit_name.split('.') {
        path.push(segment);
    }
    path.set_extension(UNIT_EXTENSION);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_and_archive_detection() {
        assert!(is_unit(Path::new("/c/org/A.class")));
        assert!(!is_unit(Path::new("/c/org/A.java")));
        assert!(is_archive(Path::new("/lib/lib1.jar")));
        assert!(is_archive(Path::new("/lib/LIB1.JAR")));
        assert!(!is_archive(Path::new("/lib/notes.txt")));
    }

    #[test]
    fn name_to_path() {
        let p = unit_path("org.example.Main", Path::new("/build/classes"));
        assert_eq!(p, PathBuf::from("/build/classes/org/example/Main.class"));
    }

    #[test]
    fn nested_class_name_keeps_dollar() {
        let p = unit_path("org.example.Main$Inner", Path::new("/c"));
        assert_eq!(p, PathBuf::from("/c/org/example/Main$Inner.class"));
    }
}

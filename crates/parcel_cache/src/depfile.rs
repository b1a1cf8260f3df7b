//! The `.dep` file format: UTF-8, one absolute path per line, nothing else.

use std::collections::BTreeSet;
use std::path::Path;

use parcel_common::TargetPath;

use crate::error::CacheError;

/// Parses the contents of the `.dep` file at `path`.
///
/// Trailing blank lines are ignored. Any other line that is empty, relative,
/// or contains control characters fails the whole parse.
pub fn parse_dep_file(text: &str, path: &Path) -> Result<BTreeSet<TargetPath>, CacheError> {
    let lines: Vec<&str> = text.lines().collect();
    let used = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);

    let mut deps = BTreeSet::new();
    for (i, line) in lines[..used].iter().enumerate() {
        let reason = if line.is_empty() {
            Some("empty line")
        } else if line.chars().any(char::is_control) {
            Some("control character in path")
        } else if !Path::new(line).is_absolute() {
            Some("not an absolute path")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(CacheError::Parse {
                path: path.to_path_buf(),
                line: i + 1,
                reason: reason.to_string(),
            });
        }
        deps.insert(TargetPath::new(line));
    }
    Ok(deps)
}

/// Renders a dependency set in `.dep` format, in sorted order.
///
/// Fails on a path that would not parse back unchanged: one that is not
/// UTF-8 or that contains control characters.
pub fn render_dep_file(deps: &BTreeSet<TargetPath>) -> Result<String, CacheError> {
    let mut out = String::new();
    for dep in deps {
        let unrepresentable = |reason| CacheError::Unrepresentable {
            path: dep.as_path().to_path_buf(),
            reason,
        };
        let line = dep
            .as_path()
            .to_str()
            .ok_or_else(|| unrepresentable("not valid UTF-8"))?;
        if line.chars().any(char::is_control) {
            return Err(unrepresentable("contains control characters"));
        }
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

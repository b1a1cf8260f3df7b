//! Modification-time staleness.

use std::path::Path;
use std::time::SystemTime;

use crate::error::ScanError;

/// Tests whether `candidate` is stale relative to `reference`.
///
/// The candidate is stale if it does not exist, or if the reference was
/// modified strictly later than the candidate. Equal timestamps count as
/// fresh, which is what makes coarse-resolution filesystems usable.
///
/// Returns [`ScanError::NotFound`] if the reference does not exist.
pub fn is_file_stale(candidate: &Path, reference: &Path) -> Result<bool, ScanError> {
    if !reference.exists() {
        return Err(ScanError::NotFound {
            path: reference.to_path_buf(),
        });
    }
    let reference_time = modified(reference)?;
    if !candidate.exists() {
        return Ok(true);
    }
    let candidate_time = modified(candidate)?;
    Ok(reference_time > candidate_time)
}

fn modified(path: &Path) -> Result<SystemTime, ScanError> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ScanError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

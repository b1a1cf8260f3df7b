//! The `.dep` entry store.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use parcel_common::{ContentHash, Relation, Staleness, TargetKind, TargetPath, UNIT_EXTENSION};
use parcel_resolve::LookupRequest;
use parcel_scan::is_file_stale;
use tracing::{debug, warn};

use crate::depfile::{parse_dep_file, render_dep_file};
use crate::error::CacheError;
use crate::manifest::HashManifest;

/// Name of the directory created under the cache root.
pub const CACHE_DIR: &str = "dependencies-cache";

const DEP_EXTENSION: &str = "dep";

/// What the cache did during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries answered from disk.
    pub reused: BTreeSet<PathBuf>,
    /// Entries written after fresh analysis.
    pub written: BTreeSet<PathBuf>,
    /// Entries that could not be written.
    pub write_failures: usize,
}

/// Reads and writes `.dep` entries under `<cacheRoot>/dependencies-cache`.
///
/// Safe to share between threads; each entry is written by whichever thread
/// analysed its target, and a target is analysed at most once per build.
#[derive(Debug)]
pub struct DependencyCache {
    dir: PathBuf,
    staleness: Staleness,
    manifest: Mutex<HashManifest>,
    stats: Mutex<CacheStats>,
}

impl DependencyCache {
    /// Opens the cache under `cache_root`. Nothing is created on disk until
    /// the first entry is written.
    pub fn open(cache_root: &Path, staleness: Staleness) -> Self {
        let dir = cache_root.join(CACHE_DIR);
        let manifest = match staleness {
            Staleness::ContentHash => HashManifest::load(&dir),
            Staleness::ModifiedTime => HashManifest::default(),
        };
        Self {
            dir,
            staleness,
            manifest: Mutex::new(manifest),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// The `dependencies-cache` directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The staleness rule in force.
    pub fn staleness(&self) -> Staleness {
        self.staleness
    }

    /// Path of the entry for `target`, relative to its relation directory.
    ///
    /// The target's location below `target_root` is mirrored, so distinct
    /// targets never share an entry. Units drop their extension
    /// (`org/example/A.class` becomes `org/example/A.dep`); archives keep their
    /// file name (`ext/x.jar` becomes `ext/x.jar.dep`).
    ///
    /// Fails for a target outside its root or with a path that is not UTF-8.
    pub fn cache_key(
        relation: Relation,
        target: &TargetPath,
        target_root: &Path,
    ) -> Result<String, CacheError> {
        let unkeyable = |reason| CacheError::Unkeyable {
            target: target.as_path().to_path_buf(),
            reason,
        };
        let relative = target
            .relative_to(target_root)
            .ok_or_else(|| unkeyable("outside its root"))?;
        let mut segments = Vec::new();
        for component in relative.components() {
            let Component::Normal(segment) = component else {
                return Err(unkeyable("not a plain relative path"));
            };
            segments.push(segment.to_str().ok_or_else(|| unkeyable("path is not UTF-8"))?);
        }
        let Some(name) = segments.pop() else {
            return Err(unkeyable("is its own root"));
        };
        let base = match relation.source_kind() {
            TargetKind::Unit => name
                .strip_suffix(UNIT_EXTENSION)
                .and_then(|stem| stem.strip_suffix('.'))
                .filter(|stem| !stem.is_empty())
                .ok_or_else(|| unkeyable("not a unit file"))?,
            TargetKind::Archive => name,
        };
        segments.push(base);
        Ok(format!("{}.{DEP_EXTENSION}", segments.join("/")))
    }

    /// Full path of the entry answering `request` in `relation`.
    pub fn entry_path(
        &self,
        relation: Relation,
        request: &LookupRequest<'_>,
    ) -> Result<PathBuf, CacheError> {
        let key = Self::cache_key(relation, request.target, request.target_root)?;
        Ok(self.dir.join(relation.as_str()).join(key))
    }

    /// Returns the cached answer for `request`, or `None` on any kind of miss.
    pub fn load(
        &self,
        relation: Relation,
        request: &LookupRequest<'_>,
    ) -> Option<BTreeSet<TargetPath>> {
        let result = Self::cache_key(relation, request.target, request.target_root)
            .and_then(|key| self.read_entry(relation, &key, request.target.as_path()));
        match result {
            Ok((entry, deps)) => {
                self.lock_stats().reused.insert(entry);
                Some(deps)
            }
            Err(e) => {
                debug!(%relation, target = %request.target, reason = %e, "cache miss");
                None
            }
        }
    }

    /// Records a freshly analysed answer. Failures are logged and counted.
    pub fn store(
        &self,
        relation: Relation,
        request: &LookupRequest<'_>,
        deps: &BTreeSet<TargetPath>,
    ) {
        let result = Self::cache_key(relation, request.target, request.target_root)
            .and_then(|key| self.write_entry(relation, &key, request.target.as_path(), deps));
        match result {
            Ok(entry) => {
                self.lock_stats().written.insert(entry);
            }
            Err(e) => {
                warn!(
                    %relation,
                    target = %request.target,
                    error = %e,
                    "could not write cache entry"
                );
                self.lock_stats().write_failures += 1;
            }
        }
    }

    /// Persists the hash manifest. Does nothing under modification-time
    /// staleness.
    pub fn save(&self) -> Result<(), CacheError> {
        if self.staleness != Staleness::ContentHash {
            return Ok(());
        }
        let manifest = self.manifest.lock().unwrap_or_else(PoisonError::into_inner);
        manifest.save(&self.dir)
    }

    /// A snapshot of this run's statistics.
    pub fn stats(&self) -> CacheStats {
        self.lock_stats().clone()
    }

    fn read_entry(
        &self,
        relation: Relation,
        key: &str,
        source: &Path,
    ) -> Result<(PathBuf, BTreeSet<TargetPath>), CacheError> {
        let entry = self.dir.join(relation.as_str()).join(key);
        let text = std::fs::read_to_string(&entry).map_err(|e| CacheError::Io {
            path: entry.clone(),
            source: e,
        })?;
        let fresh = match self.staleness {
            Staleness::ModifiedTime => matches!(is_file_stale(&entry, source), Ok(false)),
            Staleness::ContentHash => {
                let recorded = self
                    .manifest
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&manifest_key(relation, key));
                recorded.is_some() && recorded == ContentHash::of_file(source).ok()
            }
        };
        if !fresh {
            return Err(CacheError::Stale { path: entry });
        }
        let deps = parse_dep_file(&text, &entry)?;
        // A dependency deleted since the entry was written invalidates it.
        if let Some(gone) = deps.iter().find(|dep| !dep.as_path().exists()) {
            return Err(CacheError::MissingDependency {
                entry,
                dependency: gone.as_path().to_path_buf(),
            });
        }
        Ok((entry, deps))
    }

    fn write_entry(
        &self,
        relation: Relation,
        key: &str,
        source: &Path,
        deps: &BTreeSet<TargetPath>,
    ) -> Result<PathBuf, CacheError> {
        let entry = self.dir.join(relation.as_str()).join(key);
        let text = render_dep_file(deps)?;
        if let Some(parent) = entry.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&entry, text).map_err(|e| CacheError::Io {
            path: entry.clone(),
            source: e,
        })?;

        if self.staleness == Staleness::ContentHash {
            let hash = ContentHash::of_file(source).map_err(|e| CacheError::Io {
                path: source.to_path_buf(),
                source: e,
            })?;
            self.manifest
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(manifest_key(relation, key), hash);
        }
        Ok(entry)
    }

    fn lock_stats(&self) -> MutexGuard<'_, CacheStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn manifest_key(relation: Relation, key: &str) -> String {
    format!("{}/{key}", relation.as_str())
}

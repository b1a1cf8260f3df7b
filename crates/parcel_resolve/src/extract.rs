//! Concrete direct-dependency extractors.
//!
//! [`ClassRefLookup`] answers unit→unit questions straight from class files on
//! disk. The archive-facing lookups need to list and read archive members,
//! which they do through an [`ArchiveCatalog`] supplied by the caller.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use parcel_common::{is_archive, unit_path, TargetPath};
use parcel_scan::FileTree;
use tracing::debug;

use crate::classfile::parse_class_refs;
use crate::error::AnalysisError;
use crate::lookup::{DirectLookup, LookupRequest};

/// Read access to the members of archive files.
///
/// Member names are internal class names (`org/example/A`) without the
/// `.class` extension.
pub trait ArchiveCatalog: Send + Sync {
    /// Lists the units packaged in `archive`.
    fn unit_names(&self, archive: &Path) -> Result<Vec<String>, AnalysisError>;

    /// Returns the bytes of unit `name` in `archive`.
    fn read_unit(&self, archive: &Path, name: &str) -> Result<Vec<u8>, AnalysisError>;
}

impl<C: ArchiveCatalog + ?Sized> ArchiveCatalog for Arc<C> {
    fn unit_names(&self, archive: &Path) -> Result<Vec<String>, AnalysisError> {
        (**self).unit_names(archive)
    }

    fn read_unit(&self, archive: &Path, name: &str) -> Result<Vec<u8>, AnalysisError> {
        (**self).read_unit(archive, name)
    }
}

/// Unit→unit extraction from class files.
///
/// A referenced class counts as a dependency only when its class file exists
/// under the search root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassRefLookup;

impl DirectLookup for ClassRefLookup {
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
        let path = request.target.as_path();
        let refs = read_refs(path)?;
        let deps = refs
            .into_iter()
            .map(|name| unit_path(&name.replace('/', "."), request.search_root))
            .filter(|candidate| candidate.is_file())
            .map(TargetPath::new)
            .collect();
        Ok(deps)
    }
}

/// Which archives under one root package which classes.
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    by_class: HashMap<String, BTreeSet<TargetPath>>,
}

impl ArchiveIndex {
    /// Lists every archive under `root` through `catalog`.
    pub fn build<C: ArchiveCatalog + ?Sized>(
        root: &Path,
        catalog: &C,
    ) -> Result<Self, AnalysisError> {
        let mut index = Self::default();
        let mut archives = 0usize;
        for archive in FileTree::new(root).filter(|p| is_archive(p)) {
            let target = TargetPath::new(&archive);
            for name in catalog.unit_names(target.as_path())? {
                index.by_class.entry(name).or_default().insert(target.clone());
            }
            archives += 1;
        }
        debug!(
            root = %root.display(),
            archives,
            classes = index.by_class.len(),
            "indexed archives"
        );
        Ok(index)
    }

    /// Archives packaging class `name`.
    pub fn archives_for(&self, name: &str) -> impl Iterator<Item = &TargetPath> {
        self.by_class.get(name).into_iter().flatten()
    }

    /// Union of [`archives_for`](Self::archives_for) over `names`.
    pub fn archives_for_all<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> BTreeSet<TargetPath> {
        names
            .into_iter()
            .flat_map(|name| self.archives_for(name))
            .cloned()
            .collect()
    }
}

/// Builds each search root's [`ArchiveIndex`] once and shares it.
struct IndexCache<C: ?Sized> {
    catalog: Arc<C>,
    indexes: Mutex<HashMap<PathBuf, Arc<ArchiveIndex>>>,
}

impl<C: ArchiveCatalog + ?Sized> IndexCache<C> {
    fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            indexes: Mutex::new(HashMap::new()),
        }
    }

    fn index(&self, root: &Path) -> Result<Arc<ArchiveIndex>, AnalysisError> {
        let mut indexes = self.indexes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = indexes.get(root) {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(ArchiveIndex::build(root, self.catalog.as_ref())?);
        indexes.insert(root.to_path_buf(), Arc::clone(&index));
        Ok(index)
    }
}

/// Unit→archive extraction: the archives under the search root that package
/// any class the unit references.
///
/// A unit always references its own class, so an archive that packages a
/// copy of the unit is reported too.
pub struct ArchiveRefLookup<C: ?Sized> {
    indexes: IndexCache<C>,
}

impl<C: ArchiveCatalog + ?Sized> ArchiveRefLookup<C> {
    /// Creates a lookup reading archives through `catalog`.
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            indexes: IndexCache::new(catalog),
        }
    }
}

impl<C: ArchiveCatalog + ?Sized> DirectLookup for ArchiveRefLookup<C> {
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
        let refs = read_refs(request.target.as_path())?;
        let index = self.indexes.index(request.search_root)?;
        Ok(index.archives_for_all(&refs))
    }
}

/// Archive→archive extraction: the archives under the search root that
/// package any class referenced by a member of the target archive. The
/// target archive is always part of its own answer.
pub struct ArchiveToArchiveLookup<C: ?Sized> {
    indexes: IndexCache<C>,
}

impl<C: ArchiveCatalog + ?Sized> ArchiveToArchiveLookup<C> {
    /// Creates a lookup reading archives through `catalog`.
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            indexes: IndexCache::new(catalog),
        }
    }
}

impl<C: ArchiveCatalog + ?Sized> DirectLookup for ArchiveToArchiveLookup<C> {
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
        let archive = request.target.as_path();
        let catalog = self.indexes.catalog.as_ref();
        let index = self.indexes.index(request.search_root)?;

        let mut referenced = BTreeSet::new();
        for name in catalog.unit_names(archive)? {
            let data = catalog.read_unit(archive, &name)?;
            let refs = parse_class_refs(&data).map_err(|e| AnalysisError::Malformed {
                path: PathBuf::from(format!("{}!{name}", archive.display())),
                reason: e.to_string(),
            })?;
            referenced.extend(refs.referenced);
        }

        let mut deps = index.archives_for_all(&referenced);
        deps.insert(request.target.clone());
        Ok(deps)
    }
}

fn read_refs(path: &Path) -> Result<BTreeSet<String>, AnalysisError> {
    let data = std::fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let refs = parse_class_refs(&data).map_err(|e| AnalysisError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(refs.referenced)
}

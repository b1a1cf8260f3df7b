//! Direct-dependency lookup strategies.
//!
//! The resolver never analyses bytecode itself. It is handed one
//! [`DirectLookup`] per relation and trusts their answers. Decorators (such as
//! the on-disk cache) implement the same trait around another lookup.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use parcel_common::{Relation, TargetPath};

use crate::error::AnalysisError;

/// One direct-dependency question.
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    /// The unit or archive being analysed.
    pub target: &'a TargetPath,
    /// The root the target was discovered under.
    pub target_root: &'a Path,
    /// The root in which dependencies are searched for.
    pub search_root: &'a Path,
}

/// Computes the direct dependencies of a single target.
///
/// Implementations must be safe to call from several threads: targets of one
/// relation may be analysed in parallel.
pub trait DirectLookup: Send + Sync {
    /// Returns the targets `request.target` directly depends on.
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError>;
}

impl<L: DirectLookup + ?Sized> DirectLookup for Arc<L> {
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
        (**self).direct_deps(request)
    }
}

impl<L: DirectLookup + ?Sized> DirectLookup for Box<L> {
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
        (**self).direct_deps(request)
    }
}

/// A [`DirectLookup`] backed by a closure.
pub struct FnLookup<F>(F);

/// Wraps a closure as a [`DirectLookup`].
pub fn from_fn<F>(f: F) -> FnLookup<F>
where
    F: Fn(&LookupRequest<'_>) -> Result<BTreeSet<TargetPath>, AnalysisError> + Send + Sync,
{
    FnLookup(f)
}

impl<F> DirectLookup for FnLookup<F>
where
    F: Fn(&LookupRequest<'_>) -> Result<BTreeSet<TargetPath>, AnalysisError> + Send + Sync,
{
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
        (self.0)(request)
    }
}

/// The three lookup strategies a resolver needs, one per relation.
pub struct Lookups {
    /// Unit → units it references.
    pub unit_to_unit: Box<dyn DirectLookup>,
    /// Unit → archives containing units it references.
    pub unit_to_archive: Box<dyn DirectLookup>,
    /// Archive → archives its members reference.
    pub archive_to_archive: Box<dyn DirectLookup>,
}

impl Lookups {
    /// Bundles three strategies.
    pub fn new(
        unit_to_unit: impl DirectLookup + 'static,
        unit_to_archive: impl DirectLookup + 'static,
        archive_to_archive: impl DirectLookup + 'static,
    ) -> Self {
        Self {
            unit_to_unit: Box::new(unit_to_unit),
            unit_to_archive: Box::new(unit_to_archive),
            archive_to_archive: Box::new(archive_to_archive),
        }
    }

    /// Returns the strategy for `relation`.
    pub fn get(&self, relation: Relation) -> &dyn DirectLookup {
        match relation {
            Relation::UnitToUnit => self.unit_to_unit.as_ref(),
            Relation::UnitToArchive => self.unit_to_archive.as_ref(),
            Relation::ArchiveToArchive => self.archive_to_archive.as_ref(),
        }
    }

    /// Replaces every strategy with `wrap(relation, strategy)`.
    pub fn map(
        self,
        mut wrap: impl FnMut(Relation, Box<dyn DirectLookup>) -> Box<dyn DirectLookup>,
    ) -> Self {
        Self {
            unit_to_unit: wrap(Relation::UnitToUnit, self.unit_to_unit),
            unit_to_archive: wrap(Relation::UnitToArchive, self.unit_to_archive),
            archive_to_archive: wrap(Relation::ArchiveToArchive, self.archive_to_archive),
        }
    }
}

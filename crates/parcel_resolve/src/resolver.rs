//! The dependency graph resolver.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parcel_common::{is_archive, is_unit, Relation, TargetPath};
use parcel_scan::FileTree;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::depmap::DepMap;
use crate::error::ResolveError;
use crate::lookup::{DirectLookup, LookupRequest, Lookups};

/// A shared flag that stops resolver construction between targets.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Construction parameters for a [`Resolver`].
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Root of the compiled unit tree. `None` disables the unit→unit and
    /// unit→archive relations.
    pub units_root: Option<PathBuf>,
    /// Root of the archive tree. `None` disables the archive→archive relation
    /// and the unit→archive relation.
    pub archives_root: Option<PathBuf>,
    /// Analyse the targets of one relation on the rayon pool.
    pub parallel: bool,
    /// Log per-target progress at info level instead of debug.
    pub verbose: bool,
    /// Checked before each target is analysed.
    pub cancel: Option<CancelFlag>,
}

/// Direct and transitive dependencies between units and archives.
///
/// Built once from the configured roots; read-only afterwards. Queries against
/// a relation disabled by a missing root return empty sets.
#[derive(Debug, Clone)]
pub struct Resolver {
    units_root: Option<PathBuf>,
    archives_root: Option<PathBuf>,
    unit_to_unit: Option<DepMap>,
    unit_to_archive: Option<DepMap>,
    archive_to_archive: Option<DepMap>,
}

impl Resolver {
    /// Scans the configured roots and records every target's direct
    /// dependencies as reported by `lookups`.
    ///
    /// Fails with [`ResolveError::RootNotFound`] if a configured root is
    /// missing, and with [`ResolveError::Analysis`] naming the first target (in
    /// scan order) whose lookup failed. No partially populated resolver is
    /// ever returned.
    pub fn build(options: &ResolverOptions, lookups: &Lookups) -> Result<Self, ResolveError> {
        let units_root = options
            .units_root
            .as_deref()
            .map(|p| existing_root("units", p))
            .transpose()?;
        let archives_root = options
            .archives_root
            .as_deref()
            .map(|p| existing_root("archives", p))
            .transpose()?;

        let units = units_root
            .as_deref()
            .map(|root| scan_targets(root, is_unit))
            .unwrap_or_default();
        let archives = archives_root
            .as_deref()
            .map(|root| scan_targets(root, is_archive))
            .unwrap_or_default();

        let unit_to_unit = match &units_root {
            Some(root) => Some(populate(
                Relation::UnitToUnit,
                &units,
                root,
                root,
                lookups,
                options,
            )?),
            None => None,
        };
        let unit_to_archive = match (&units_root, &archives_root) {
            (Some(units_dir), Some(archives_dir)) => Some(populate(
                Relation::UnitToArchive,
                &units,
                units_dir,
                archives_dir,
                lookups,
                options,
            )?),
            _ => None,
        };
        let archive_to_archive = match &archives_root {
            Some(root) => Some(populate(
                Relation::ArchiveToArchive,
                &archives,
                root,
                root,
                lookups,
                options,
            )?),
            None => None,
        };

        Ok(Self {
            units_root,
            archives_root,
            unit_to_unit,
            unit_to_archive,
            archive_to_archive,
        })
    }

    /// Assembles a resolver from already populated relations. `None` marks a
    /// relation as disabled.
    pub fn from_maps(
        unit_to_unit: Option<DepMap>,
        unit_to_archive: Option<DepMap>,
        archive_to_archive: Option<DepMap>,
    ) -> Self {
        Self {
            units_root: None,
            archives_root: None,
            unit_to_unit,
            unit_to_archive,
            archive_to_archive,
        }
    }

    /// The canonical units root, if configured.
    pub fn units_root(&self) -> Option<&Path> {
        self.units_root.as_deref()
    }

    /// The canonical archives root, if configured.
    pub fn archives_root(&self) -> Option<&Path> {
        self.archives_root.as_deref()
    }

    /// The map for `relation`, or `None` if the relation is disabled.
    pub fn relation(&self, relation: Relation) -> Option<&DepMap> {
        match relation {
            Relation::UnitToUnit => self.unit_to_unit.as_ref(),
            Relation::UnitToArchive => self.unit_to_archive.as_ref(),
            Relation::ArchiveToArchive => self.archive_to_archive.as_ref(),
        }
    }

    /// Units that `unit` directly references.
    pub fn shallow_unit_deps(
        &self,
        unit: impl AsRef<Path>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.shallow(Relation::UnitToUnit, unit.as_ref())
    }

    /// Union of [`shallow_unit_deps`](Self::shallow_unit_deps) over `units`.
    pub fn shallow_unit_deps_all<'a>(
        &self,
        units: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.shallow_all(Relation::UnitToUnit, units)
    }

    /// Every unit reachable from `unit`, including `unit`.
    pub fn deep_unit_deps(
        &self,
        unit: impl AsRef<Path>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.deep(Relation::UnitToUnit, unit.as_ref())
    }

    /// Union of [`deep_unit_deps`](Self::deep_unit_deps) over `units`.
    pub fn deep_unit_deps_all<'a>(
        &self,
        units: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.deep_all(Relation::UnitToUnit, units)
    }

    /// Archives containing units that `unit` directly references.
    ///
    /// This may include the archive that packages `unit` itself.
    pub fn shallow_archive_deps_of_unit(
        &self,
        unit: impl AsRef<Path>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.shallow(Relation::UnitToArchive, unit.as_ref())
    }

    /// Union of [`shallow_archive_deps_of_unit`](Self::shallow_archive_deps_of_unit) over `units`.
    pub fn shallow_archive_deps_of_unit_all<'a>(
        &self,
        units: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.shallow_all(Relation::UnitToArchive, units)
    }

    /// The archive closure of `unit`'s direct archive dependencies.
    ///
    /// Only `unit`'s own archive references are followed, not those of the
    /// units it depends on. To cover everything a unit needs at run time,
    /// pass [`deep_unit_deps`](Self::deep_unit_deps) to
    /// [`deep_archive_deps_of_unit_all`](Self::deep_archive_deps_of_unit_all).
    pub fn deep_archive_deps_of_unit(
        &self,
        unit: impl AsRef<Path>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        let direct = self.shallow_archive_deps_of_unit(unit)?;
        self.deep_archive_deps_of_archive_all(&direct)
    }

    /// Union of [`deep_archive_deps_of_unit`](Self::deep_archive_deps_of_unit) over `units`.
    pub fn deep_archive_deps_of_unit_all<'a>(
        &self,
        units: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        let direct = self.shallow_archive_deps_of_unit_all(units)?;
        self.deep_archive_deps_of_archive_all(&direct)
    }

    /// Archives that `archive`'s members directly reference.
    pub fn shallow_archive_deps_of_archive(
        &self,
        archive: impl AsRef<Path>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.shallow(Relation::ArchiveToArchive, archive.as_ref())
    }

    /// Union of [`shallow_archive_deps_of_archive`](Self::shallow_archive_deps_of_archive)
    /// over `archives`.
    pub fn shallow_archive_deps_of_archive_all<'a>(
        &self,
        archives: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.shallow_all(Relation::ArchiveToArchive, archives)
    }

    /// Every archive reachable from `archive`, including `archive`.
    pub fn deep_archive_deps_of_archive(
        &self,
        archive: impl AsRef<Path>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.deep(Relation::ArchiveToArchive, archive.as_ref())
    }

    /// Union of [`deep_archive_deps_of_archive`](Self::deep_archive_deps_of_archive)
    /// over `archives`.
    pub fn deep_archive_deps_of_archive_all<'a>(
        &self,
        archives: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.deep_all(Relation::ArchiveToArchive, archives)
    }

    fn shallow(
        &self,
        relation: Relation,
        target: &Path,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        match self.relation(relation) {
            Some(map) => map.shallow(&TargetPath::new(target)).cloned(),
            None => Ok(BTreeSet::new()),
        }
    }

    fn shallow_all<'a>(
        &self,
        relation: Relation,
        targets: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        match self.relation(relation) {
            Some(map) => map.shallow_all(targets),
            None => Ok(BTreeSet::new()),
        }
    }

    fn deep(
        &self,
        relation: Relation,
        target: &Path,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        match self.relation(relation) {
            Some(map) => map.deep(&TargetPath::new(target)),
            None => Ok(BTreeSet::new()),
        }
    }

    fn deep_all<'a>(
        &self,
        relation: Relation,
        targets: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        match self.relation(relation) {
            Some(map) => map.deep_all(targets),
            None => Ok(BTreeSet::new()),
        }
    }
}

fn existing_root(root: &'static str, path: &Path) -> Result<PathBuf, ResolveError> {
    if !path.is_dir() {
        return Err(ResolveError::RootNotFound {
            root,
            path: path.to_path_buf(),
        });
    }
    Ok(TargetPath::new(path).into_path_buf())
}

/// Lists the matching files under `root` in breadth-first order, each
/// canonical target once.
fn scan_targets(root: &Path, keep: fn(&Path) -> bool) -> Vec<TargetPath> {
    let mut seen = HashSet::new();
    FileTree::new(root)
        .filter(|p| keep(p))
        .map(TargetPath::new)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn populate(
    relation: Relation,
    targets: &[TargetPath],
    target_root: &Path,
    search_root: &Path,
    lookups: &Lookups,
    options: &ResolverOptions,
) -> Result<DepMap, ResolveError> {
    let lookup = lookups.get(relation);
    if options.verbose {
        info!(%relation, targets = targets.len(), "populating relation");
    } else {
        debug!(%relation, targets = targets.len(), "populating relation");
    }

    let analyze = |target: &TargetPath| {
        analyze_target(relation, target, target_root, search_root, lookup, options)
    };
    let results: Vec<BTreeSet<TargetPath>> = if options.parallel {
        let collected: Vec<_> = targets.par_iter().map(analyze).collect();
        collected.into_iter().collect::<Result<_, _>>()?
    } else {
        targets.iter().map(analyze).collect::<Result<_, _>>()?
    };

    let mut map = DepMap::new(relation);
    for (target, deps) in targets.iter().zip(results) {
        map.declare(target.clone());
        for dep in deps {
            map.add(target.clone(), dep);
        }
    }
    debug!(%relation, declared = map.len(), "relation populated");
    Ok(map)
}

fn analyze_target(
    relation: Relation,
    target: &TargetPath,
    target_root: &Path,
    search_root: &Path,
    lookup: &dyn DirectLookup,
    options: &ResolverOptions,
) -> Result<BTreeSet<TargetPath>, ResolveError> {
    if options.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
        return Err(ResolveError::Cancelled);
    }
    if options.verbose {
        info!(%relation, %target, "analyzing");
    } else {
        debug!(%relation, %target, "analyzing");
    }

    let request = LookupRequest {
        target,
        target_root,
        search_root,
    };
    lookup
        .direct_deps(&request)
        .map_err(|source| ResolveError::Analysis {
            relation,
            target: target.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::lookup::from_fn;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    /// Lookup answering from a fixed edge list keyed by file name.
    struct TableLookup {
        edges: HashMap<&'static str, Vec<&'static str>>,
        calls: AtomicUsize,
    }

    impl TableLookup {
        fn new(edges: &[(&'static str, &'static str)]) -> Self {
            let mut table: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
            for (from, to) in edges {
                table.entry(*from).or_default().push(*to);
            }
            Self {
                edges: table,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DirectLookup for TableLookup {
        fn direct_deps(
            &self,
            request: &LookupRequest<'_>,
        ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = request.target.file_name().unwrap_or_default();
            Ok(self
                .edges
                .get(name)
                .into_iter()
                .flatten()
                .map(|dep| TargetPath::new(request.search_root.join(dep)))
                .collect())
        }
    }

    fn nothing() -> TableLookup {
        TableLookup::new(&[])
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        units: PathBuf,
        archives: PathBuf,
    }

    impl Fixture {
        fn new(units: &[&str], archives: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let units_dir = dir.path().join("classes");
            let archives_dir = dir.path().join("lib");
            std::fs::create_dir_all(&units_dir).unwrap();
            std::fs::create_dir_all(&archives_dir).unwrap();
            for name in units {
                let p = units_dir.join(name);
                std::fs::create_dir_all(p.parent().unwrap()).unwrap();
                std::fs::write(p, b"").unwrap();
            }
            for name in archives {
                std::fs::write(archives_dir.join(name), b"").unwrap();
            }
            Self {
                _dir: dir,
                units: units_dir,
                archives: archives_dir,
            }
        }

        fn options(&self) -> ResolverOptions {
            ResolverOptions {
                units_root: Some(self.units.clone()),
                archives_root: Some(self.archives.clone()),
                ..ResolverOptions::default()
            }
        }

        fn unit(&self, name: &str) -> TargetPath {
            TargetPath::new(self.units.join(name))
        }

        fn archive(&self, name: &str) -> TargetPath {
            TargetPath::new(self.archives.join(name))
        }
    }

    #[test]
    fn missing_root_aborts() {
        let fx = Fixture::new(&[], &[]);
        let options = ResolverOptions {
            units_root: Some(fx.units.join("missing")),
            ..ResolverOptions::default()
        };
        let lookups = Lookups::new(nothing(), nothing(), nothing());
        let err = Resolver::build(&options, &lookups).unwrap_err();
        assert!(matches!(err, ResolveError::RootNotFound { root: "units", .. }));
    }

    #[test]
    fn omitted_roots_give_empty_answers() {
        let lookups = Lookups::new(nothing(), nothing(), nothing());
        let resolver = Resolver::build(&ResolverOptions::default(), &lookups).unwrap();
        assert!(resolver.deep_unit_deps("/any/A.class").unwrap().is_empty());
        assert!(resolver.shallow_archive_deps_of_unit("/any/A.class").unwrap().is_empty());
        assert!(resolver.deep_archive_deps_of_archive("/any/x.jar").unwrap().is_empty());
    }

    #[test]
    fn units_only_disables_archive_relations() {
        let fx = Fixture::new(&["A.class"], &[]);
        let options = ResolverOptions {
            units_root: Some(fx.units.clone()),
            ..ResolverOptions::default()
        };
        let archive_lookup = from_fn(|_| Err(AnalysisError::External("never called".into())));
        let lookups = Lookups::new(nothing(), archive_lookup, nothing());
        let resolver = Resolver::build(&options, &lookups).unwrap();
        assert!(resolver.relation(Relation::UnitToArchive).is_none());
        assert!(resolver.shallow_archive_deps_of_unit(fx.unit("A.class")).unwrap().is_empty());
        assert_eq!(
            resolver.deep_unit_deps(fx.unit("A.class")).unwrap(),
            BTreeSet::from([fx.unit("A.class")])
        );
    }

    #[test]
    fn end_to_end_scenario() {
        let fx = Fixture::new(&["A.class", "B.class"], &["lib1.jar", "lib2.jar"]);
        let lookups = Lookups::new(
            TableLookup::new(&[("A.class", "B.class")]),
            TableLookup::new(&[("B.class", "lib1.jar")]),
            TableLookup::new(&[("lib1.jar", "lib2.jar")]),
        );
        let resolver = Resolver::build(&fx.options(), &lookups).unwrap();

        assert_eq!(
            resolver.deep_unit_deps(fx.unit("A.class")).unwrap(),
            BTreeSet::from([fx.unit("A.class"), fx.unit("B.class")])
        );
        assert!(resolver.deep_archive_deps_of_unit(fx.unit("A.class")).unwrap().is_empty());
        assert_eq!(
            resolver.deep_archive_deps_of_unit(fx.unit("B.class")).unwrap(),
            BTreeSet::from([fx.archive("lib1.jar"), fx.archive("lib2.jar")])
        );

        let closure = resolver.deep_unit_deps(fx.unit("A.class")).unwrap();
        assert_eq!(
            resolver.deep_archive_deps_of_unit_all(&closure).unwrap(),
            BTreeSet::from([fx.archive("lib1.jar"), fx.archive("lib2.jar")])
        );
    }

    #[test]
    fn relative_query_paths_are_canonicalized() {
        let fx = Fixture::new(&["pkg/A.class"], &[]);
        let lookups = Lookups::new(nothing(), nothing(), nothing());
        let resolver = Resolver::build(&fx.options(), &lookups).unwrap();
        let dotted = fx.units.join("pkg").join("..").join("pkg").join("A.class");
        assert!(resolver.shallow_unit_deps(&dotted).unwrap().is_empty());
    }

    #[test]
    fn unknown_and_empty_are_distinguished() {
        let fx = Fixture::new(&["A.class"], &[]);
        let lookups = Lookups::new(nothing(), nothing(), nothing());
        let resolver = Resolver::build(&fx.options(), &lookups).unwrap();

        assert!(resolver.shallow_unit_deps(fx.unit("A.class")).unwrap().is_empty());
        let err = resolver.shallow_unit_deps(fx.unit("Ghost.class")).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownTarget { .. }));
    }

    #[test]
    fn analysis_failure_names_target() {
        let fx = Fixture::new(&["Good.class", "Bad.class"], &[]);
        let failing = from_fn(|req| {
            if req.target.file_name() == Some("Bad.class") {
                Err(AnalysisError::External("unreadable".into()))
            } else {
                Ok(BTreeSet::new())
            }
        });
        let lookups = Lookups::new(failing, nothing(), nothing());
        let err = Resolver::build(&fx.options(), &lookups).unwrap_err();
        match err {
            ResolveError::Analysis { relation, target, .. } => {
                assert_eq!(relation, Relation::UnitToUnit);
                assert_eq!(target, fx.unit("Bad.class"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_unit_files_are_ignored() {
        let fx = Fixture::new(&["A.class", "notes.txt"], &["lib.jar", "README"]);
        let lookups = Lookups::new(nothing(), nothing(), nothing());
        let resolver = Resolver::build(&fx.options(), &lookups).unwrap();
        assert_eq!(resolver.relation(Relation::UnitToUnit).unwrap().len(), 1);
        assert_eq!(resolver.relation(Relation::ArchiveToArchive).unwrap().len(), 1);
    }

    #[test]
    fn parallel_matches_sequential() {
        let units: Vec<String> = (0..40).map(|i| format!("p{}/U{i}.class", i % 4)).collect();
        let unit_refs: Vec<&str> = units.iter().map(String::as_str).collect();
        let fx = Fixture::new(&unit_refs, &[]);
        let chain = from_fn(|req| {
            let name = req.target.file_name().unwrap_or_default();
            let n: usize = name[1..name.len() - ".class".len()].parse().unwrap_or(0);
            let next = n + 1;
            let dep = req
                .search_root
                .join(format!("p{}", next % 4))
                .join(format!("U{next}.class"));
            Ok(if dep.exists() {
                BTreeSet::from([TargetPath::new(dep)])
            } else {
                BTreeSet::new()
            })
        });
        let lookups = Lookups::new(chain, nothing(), nothing());

        let sequential = Resolver::build(&fx.options(), &lookups).unwrap();
        let parallel = Resolver::build(
            &ResolverOptions {
                parallel: true,
                ..fx.options()
            },
            &lookups,
        )
        .unwrap();

        let start = fx.unit("p0/U0.class");
        let a = sequential.deep_unit_deps(&start).unwrap();
        let b = parallel.deep_unit_deps(&start).unwrap();
        assert_eq!(a.len(), 40);
        assert_eq!(a, b);
    }

    #[test]
    fn cancelled_build_returns_no_resolver() {
        let fx = Fixture::new(&["A.class"], &[]);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let options = ResolverOptions {
            cancel: Some(cancel),
            ..fx.options()
        };
        let lookups = Lookups::new(nothing(), nothing(), nothing());
        let err = Resolver::build(&options, &lookups).unwrap_err();
        assert!(matches!(err, ResolveError::Cancelled));
    }

    #[test]
    fn each_target_analysed_once_per_relation() {
        let fx = Fixture::new(&["A.class", "B.class"], &["x.jar"]);
        let counting = Arc::new(nothing());
        let lookups = Lookups::new(counting.clone(), counting.clone(), counting.clone());
        Resolver::build(&fx.options(), &lookups).unwrap();
        // 2 units × (unit→unit + unit→archive) + 1 archive
        assert_eq!(counting.calls.load(Ordering::SeqCst), 5);
    }
}

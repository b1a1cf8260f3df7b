//! A single dependency relation and its closure queries.

use std::collections::{BTreeSet, HashMap, VecDeque};

use parcel_common::{Relation, TargetPath};

use crate::error::ResolveError;

/// Direct dependencies of every declared target in one relation.
///
/// The map is append-only: targets are declared, then edges are added. A
/// declared target with no edges is distinct from an undeclared one, which
/// queries report as [`ResolveError::UnknownTarget`]. Declaring a target or
/// adding an edge more than once has no further effect.
#[derive(Debug, Clone)]
pub struct DepMap {
    relation: Relation,
    deps: HashMap<TargetPath, BTreeSet<TargetPath>>,
}

impl DepMap {
    /// Creates an empty relation.
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            deps: HashMap::new(),
        }
    }

    /// The relation this map records.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Declares `target` with an empty dependency set, if not already declared.
    pub fn declare(&mut self, target: TargetPath) {
        self.deps.entry(target).or_default();
    }

    /// Records that `target` directly depends on `dependency`, declaring
    /// `target` first if needed.
    pub fn add(&mut self, target: TargetPath, dependency: TargetPath) {
        self.deps.entry(target).or_default().insert(dependency);
    }

    /// Returns `true` if `target` has been declared.
    pub fn is_declared(&self, target: &TargetPath) -> bool {
        self.deps.contains_key(target)
    }

    /// Number of declared targets.
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Returns `true` if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Iterates over the declared targets in no particular order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetPath> {
        self.deps.keys()
    }

    /// The direct dependencies of `target`.
    pub fn shallow(&self, target: &TargetPath) -> Result<&BTreeSet<TargetPath>, ResolveError> {
        self.deps
            .get(target)
            .ok_or_else(|| ResolveError::UnknownTarget {
                relation: self.relation,
                target: target.clone(),
            })
    }

    /// The union of the direct dependencies of every target in `targets`.
    pub fn shallow_all<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        let mut all = BTreeSet::new();
        for target in targets {
            all.extend(self.shallow(target)?.iter().cloned());
        }
        Ok(all)
    }

    /// Every target reachable from `target` through zero or more edges,
    /// including `target` itself.
    ///
    /// Cycles are harmless: a target enters the pending queue only when it is
    /// first accepted, and the accepted set only grows. Dependencies that are
    /// not themselves declared in this relation are treated as leaves.
    pub fn deep(&self, target: &TargetPath) -> Result<BTreeSet<TargetPath>, ResolveError> {
        self.shallow(target)?;

        let mut pending = VecDeque::from([target.clone()]);
        let mut accepted = BTreeSet::from([target.clone()]);

        while let Some(next) = pending.pop_front() {
            let Some(direct) = self.deps.get(&next) else {
                continue;
            };
            for dep in direct {
                if accepted.insert(dep.clone()) {
                    pending.push_back(dep.clone());
                }
            }
        }
        Ok(accepted)
    }

    /// The union of [`deep`](Self::deep) over every target in `targets`.
    pub fn deep_all<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a TargetPath>,
    ) -> Result<BTreeSet<TargetPath>, ResolveError> {
        let mut all = BTreeSet::new();
        for target in targets {
            if all.contains(target) && self.is_declared(target) {
                // Already reached through an earlier target's closure.
                continue;
            }
            all.extend(self.deep(target)?);
        }
        Ok(all)
    }
}

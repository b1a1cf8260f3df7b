//! The three dependency relations tracked by the resolver.

use std::fmt;

/// What kind of artifact a target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A single compiled unit (one class file).
    Unit,
    /// A packaged bundle of units (a jar file).
    Archive,
}

/// A direct-dependency relation between two kinds of targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// Compiled units to the other units they reference.
    UnitToUnit,
    /// Compiled units to the archives containing units they reference.
    UnitToArchive,
    /// Archives to the archives their members reference.
    ArchiveToArchive,
}

impl Relation {
    /// All relations, in the order the resolver populates them.
    pub const ALL: [Relation; 3] = [
        Relation::UnitToUnit,
        Relation::UnitToArchive,
        Relation::ArchiveToArchive,
    ];

    /// The stable name of the relation, also its cache subdirectory.
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::UnitToUnit => "unit-to-unit",
            Relation::UnitToArchive => "unit-to-archive",
            Relation::ArchiveToArchive => "archive-to-archive",
        }
    }

    /// The kind of target that is a key in this relation.
    pub fn source_kind(self) -> TargetKind {
        match self {
            Relation::UnitToUnit | Relation::UnitToArchive => TargetKind::Unit,
            Relation::ArchiveToArchive => TargetKind::Archive,
        }
    }

    /// The kind of target that appears in dependency sets of this relation.
    pub fn dependency_kind(self) -> TargetKind {
        match self {
            Relation::UnitToUnit => TargetKind::Unit,
            Relation::UnitToArchive | Relation::ArchiveToArchive => TargetKind::Archive,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

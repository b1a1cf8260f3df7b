//! Dependency graph resolution between compiled units and archives.
//!
//! A [`Resolver`] scans a units root and an archives root, asks an injected
//! [`DirectLookup`] strategy for the direct dependencies of every target, and
//! records them in three relations (unit→unit, unit→archive,
//! archive→archive). It then answers shallow (direct) and deep (transitive
//! closure) queries over each relation.
//!
//! All analysis happens at construction; queries only read in-memory maps.
//! The concrete bytecode extractors in [`extract`] read class files directly
//! and reach into archives through the [`ArchiveCatalog`] boundary.

#![warn(missing_docs)]

pub mod classfile;
pub mod depmap;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod resolver;

pub use classfile::{parse_class_refs, ClassFormatError, ClassRefs};
pub use depmap::DepMap;
pub use error::{AnalysisError, ResolveError};
pub use extract::{
    ArchiveCatalog, ArchiveIndex, ArchiveRefLookup, ArchiveToArchiveLookup, ClassRefLookup,
};
pub use lookup::{from_fn, DirectLookup, FnLookup, LookupRequest, Lookups};
pub use resolver::{CancelFlag, Resolver, ResolverOptions};

//! Shared foundational types used across the parcel packaging tools.
//!
//! This crate provides target identity (canonical paths used as map and cache
//! keys), the three dependency relations, staleness policies, content hashing,
//! and the naming conventions that map compiled units to files.

#![warn(missing_docs)]

pub mod hash;
pub mod naming;
pub mod relation;
pub mod staleness;
pub mod target;

pub use hash::ContentHash;
pub use naming::{is_archive, is_unit, unit_path, ARCHIVE_EXTENSION, UNIT_EXTENSION};
pub use relation::{Relation, TargetKind};
pub use staleness::Staleness;
pub use target::TargetPath;

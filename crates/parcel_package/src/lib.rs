//! Component packaging on top of the dependency resolver.
//!
//! For a component, the [`Packager`] gathers the unit closure of its class
//! into a component archive, collects the archives that closure needs (minus
//! platform-provided ones), adds anything the component declares explicitly,
//! and hands the result to an [`Uploader`]. Archive encoding and network
//! transfer stay behind the [`ArchiveWriter`] and [`Uploader`] traits.

#![warn(missing_docs)]

pub mod boundary;
pub mod descriptor;
pub mod error;
pub mod open;
pub mod packager;

pub use boundary::{ArchiveEntry, ArchiveWriter, BoundaryError, Uploader};
pub use descriptor::{AppletDescriptor, ComponentDescriptor};
pub use error::PackageError;
pub use open::{open_resolver, resolver_options};
pub use packager::{BatchReport, PackagePlan, Packager, PackagerOptions, PlannedArchive};

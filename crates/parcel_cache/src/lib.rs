//! Incremental on-disk cache for direct-dependency analysis.
//!
//! Each analysed target gets a `.dep` file listing its direct dependencies,
//! one canonical path per line:
//!
//! ```text
//! <cacheRoot>/dependencies-cache/
//!   unit-to-unit/org/example/A.dep
//!   unit-to-archive/org/example/A.dep
//!   archive-to-archive/ext/x.jar.dep
//! ```
//!
//! Entries mirror the target's location below its root. An entry is reused
//! only while it is fresh and every dependency it lists still exists.
//!
//! A [`CachedLookup`] wraps any [`DirectLookup`](parcel_resolve::DirectLookup)
//! and consults the cache first. Read problems of any kind are cache misses;
//! write problems are logged and counted but never fail analysis.
//!
//! One cache directory must not be used by two resolver builds at once.

#![warn(missing_docs)]

pub mod cache;
pub mod depfile;
pub mod error;
pub mod lookup;
pub mod manifest;

pub use cache::{CacheStats, DependencyCache, CACHE_DIR};
pub use depfile::{parse_dep_file, render_dep_file};
pub use error::CacheError;
pub use lookup::{wrap_lookups, CachedLookup};
pub use manifest::HashManifest;

//! Building a resolver from configuration.

use std::sync::Arc;

use parcel_cache::{wrap_lookups, DependencyCache};
use parcel_config::ParcelConfig;
use parcel_resolve::{Lookups, Resolver, ResolverOptions};
use tracing::{debug, warn};

use crate::error::PackageError;

/// Resolver options for a loaded configuration.
pub fn resolver_options(config: &ParcelConfig) -> ResolverOptions {
    ResolverOptions {
        units_root: config.roots.units.clone(),
        archives_root: config.roots.archives.clone(),
        parallel: config.analysis.parallel,
        verbose: config.analysis.verbose,
        cancel: None,
    }
}

/// Builds a resolver for `config`, putting `lookups` behind the dependency
/// cache when a cache root is configured.
///
/// Expects paths already resolved (see [`ParcelConfig::resolve_paths`]).
pub fn open_resolver(config: &ParcelConfig, lookups: Lookups) -> Result<Resolver, PackageError> {
    let options = resolver_options(config);
    let Some(cache_root) = &config.roots.cache else {
        return Ok(Resolver::build(&options, &lookups)?);
    };

    let cache = Arc::new(DependencyCache::open(cache_root, config.analysis.staleness));
    let resolver = Resolver::build(&options, &wrap_lookups(lookups, Arc::clone(&cache)))?;
    if let Err(e) = cache.save() {
        warn!(error = %e, "could not save cache manifest");
    }
    let stats = cache.stats();
    debug!(
        reused = stats.reused.len(),
        written = stats.written.len(),
        write_failures = stats.write_failures,
        "dependency cache"
    );
    Ok(resolver)
}

//! Cache decorator for direct-dependency lookups.

use std::collections::BTreeSet;
use std::sync::Arc;

use parcel_common::{Relation, TargetPath};
use parcel_resolve::{AnalysisError, DirectLookup, LookupRequest, Lookups};

use crate::cache::DependencyCache;

/// A [`DirectLookup`] that answers from the cache when it can and records
/// every fresh answer of the lookup it wraps.
pub struct CachedLookup<L> {
    relation: Relation,
    inner: L,
    cache: Arc<DependencyCache>,
}

impl<L: DirectLookup> CachedLookup<L> {
    /// Wraps `inner`, which answers questions in `relation`.
    pub fn new(relation: Relation, inner: L, cache: Arc<DependencyCache>) -> Self {
        Self {
            relation,
            inner,
            cache,
        }
    }
}

impl<L: DirectLookup> DirectLookup for CachedLookup<L> {
    fn direct_deps(
        &self,
        request: &LookupRequest<'_>,
    ) -> Result<BTreeSet<TargetPath>, AnalysisError> {
        if let Some(deps) = self.cache.load(self.relation, request) {
            return Ok(deps);
        }
        let deps = self.inner.direct_deps(request)?;
        self.cache.store(self.relation, request, &deps);
        Ok(deps)
    }
}

/// Puts every lookup in `lookups` behind `cache`.
pub fn wrap_lookups(lookups: Lookups, cache: Arc<DependencyCache>) -> Lookups {
    lookups.map(|relation, inner| -> Box<dyn DirectLookup> {
        Box::new(CachedLookup::new(relation, inner, Arc::clone(&cache)))
    })
}

//! Drug lookups routed through the result cache.
//!
//! - [`search`](DrugService::search) - name search with detail enrichment
//! - [`drug_details`](DrugService::drug_details) - one identifier's details
//! - [`validate_rxcui`](DrugService::validate_rxcui) - existence check

mod lookup;
mod search;

pub use search::Enrichment;

use crate::cache::ResultCache;
use crate::config::CacheSettings;
use crate::rxnorm::TerminologySource;
use std::sync::Arc;
use std::time::Duration;

/// Cached access to a [`TerminologySource`].
#[derive(Clone)]
pub struct DrugService {
    source: Arc<dyn TerminologySource>,
    cache: ResultCache,
    ttl: Duration,
}

impl std::fmt::Debug for DrugService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrugService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl DrugService {
    /// Create a service caching every lookup for [`CacheSettings::TTL`].
    pub fn new(source: Arc<dyn TerminologySource>, cache: ResultCache) -> Self {
        Self::with_ttl(source, cache, CacheSettings::TTL)
    }

    /// Create a service with a custom entry lifetime.
    pub fn with_ttl(source: Arc<dyn TerminologySource>, cache: ResultCache, ttl: Duration) -> Self {
        Self { source, cache, ttl }
    }
}

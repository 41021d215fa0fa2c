//! Single-identifier lookups.

use super::DrugService;
use crate::cache::CacheKey;
use crate::models::DrugRecord;
use crate::Result;

impl DrugService {
    /// Details for one identifier, cached under `drug_details_<rxcui>`.
    ///
    /// `Ok(None)` (unknown identifier) is cached like any other result.
    pub async fn drug_details(&self, rxcui: &str) -> Result<Option<DrugRecord>> {
        self.cache
            .get_or_compute(&CacheKey::details(rxcui), self.ttl, move || {
                self.source.fetch_details(rxcui)
            })
            .await
    }

    /// Whether the terminology service knows the identifier, cached under
    /// `rxcui_validation_<rxcui>`.
    pub async fn validate_rxcui(&self, rxcui: &str) -> Result<bool> {
        self.cache
            .get_or_compute(&CacheKey::validation(rxcui), self.ttl, move || {
                self.source.check_exists(rxcui)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{record, FakeSource};
    use super::*;
    use crate::cache::{MemoryCache, ResultCache};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn service(source: Arc<FakeSource>) -> DrugService {
        DrugService::new(source, ResultCache::new(Arc::new(MemoryCache::new())))
    }

    #[tokio::test]
    async fn test_drug_details_cached() {
        let source = Arc::new(FakeSource::with_drugs("aspirin", &["1191"]));
        let drugs = service(source.clone());

        assert_eq!(drugs.drug_details("1191").await.unwrap(), Some(record("1191")));
        assert_eq!(drugs.drug_details("1191").await.unwrap(), Some(record("1191")));
        assert_eq!(source.detail_calls(), vec!["1191"]);
    }

    #[tokio::test]
    async fn test_unknown_identifier_cached_as_none() {
        let source = Arc::new(FakeSource::default());
        let drugs = service(source.clone());

        assert!(drugs.drug_details("0").await.unwrap().is_none());
        assert!(drugs.drug_details("0").await.unwrap().is_none());
        assert_eq!(source.detail_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_rxcui_cached() {
        let source = Arc::new(FakeSource::with_drugs("aspirin", &["1191"]));
        let drugs = service(source.clone());

        assert!(drugs.validate_rxcui("1191").await.unwrap());
        assert!(drugs.validate_rxcui("1191").await.unwrap());
        assert!(!drugs.validate_rxcui("999").await.unwrap());
        assert_eq!(source.exists_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_validate_rxcui_transport_failure_propagates() {
        let mut fake = FakeSource::default();
        fake.failing.insert("1191".to_string());
        let drugs = service(Arc::new(fake));

        let err = drugs.validate_rxcui("1191").await.unwrap_err();
        assert!(err.is_upstream());
    }
}

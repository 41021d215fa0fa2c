//! Name search with per-candidate detail enrichment.

use super::DrugService;
use crate::cache::CacheKey;
use crate::models::DrugRecord;
use crate::Result;
use futures::stream::{self, StreamExt};
use tracing::debug;

/// Outcome of enriching one search candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Found(DrugRecord),
    Skipped { rxcui: String, reason: String },
}

impl Enrichment {
    /// The record, or `None` after logging why the candidate was dropped.
    fn into_record(self) -> Option<DrugRecord> {
        match self {
            Enrichment::Found(record) => Some(record),
            Enrichment::Skipped { rxcui, reason } => {
                debug!("Skipping search candidate {}: {}", rxcui, reason);
                None
            }
        }
    }
}

impl DrugService {
    /// Search drugs by name and return up to `limit` enriched records.
    ///
    /// The assembled list is cached under the literal search term. A hit
    /// returns that list without consulting any identifier-level entry.
    /// Candidates whose details cannot be fetched are skipped; a failure of
    /// the name search itself is returned to the caller.
    pub async fn search(&self, name: &str, limit: usize) -> Result<Vec<DrugRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        self.cache
            .get_or_compute(&CacheKey::search(name), self.ttl, move || async move {
                let candidates = self.source.find_candidates(name).await?;
                Ok(self.enrich(candidates, limit).await)
            })
            .await
    }

    /// Resolve candidates in upstream order until `limit` records are found.
    ///
    /// Up to `limit` detail lookups run at once; results are consumed in
    /// candidate order regardless of completion order.
    async fn enrich(&self, candidates: Vec<String>, limit: usize) -> Vec<DrugRecord> {
        let total = candidates.len();
        let mut outcomes = stream::iter(candidates)
            .map(|rxcui| self.enrich_one(rxcui))
            .buffered(limit);

        let mut records = Vec::with_capacity(limit.min(total));
        while let Some(outcome) = outcomes.next().await {
            if let Some(record) = outcome.into_record() {
                records.push(record);
                if records.len() >= limit {
                    break;
                }
            }
        }

        debug!("Enriched {} of {} candidates", records.len(), total);
        records
    }

    async fn enrich_one(&self, rxcui: String) -> Enrichment {
        match self.drug_details(&rxcui).await {
            Ok(Some(record)) => Enrichment::Found(record),
            Ok(None) => Enrichment::Skipped {
                rxcui,
                reason: "no details available".to_string(),
            },
            Err(e) => Enrichment::Skipped {
                rxcui,
                reason: e.to_string(),
            },
        }
    }
}

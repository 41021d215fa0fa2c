//! RxList Core - headless library for RxNorm drug lookups and medication lists.
//!
//! This crate holds everything below the HTTP layer: the RxNav client, the
//! TTL result cache, the search aggregator, the per-client rate limiter, and
//! the SQLite medication list store. The `rxlist-server` crate wires these
//! into an axum application.
//!
//! # Example
//!
//! ```rust,ignore
//! use rxlist_core::{DrugService, MemoryCache, ResultCache, RxNormClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rxlist_core::Result<()> {
//!     let source = Arc::new(RxNormClient::new()?);
//!     let cache = ResultCache::new(Arc::new(MemoryCache::new()));
//!     let drugs = DrugService::new(source, cache);
//!
//!     for drug in drugs.search("aspirin", 5).await? {
//!         println!("{} {}", drug.rxcui, drug.drug_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod drugs;
pub mod error;
pub mod medications;
pub mod models;
pub mod network;
pub mod rate_limit;
pub mod rxnorm;

// Re-export commonly used types
pub use cache::{CacheBackend, CacheKey, MemoryCache, ResultCache, SqliteCache};
pub use drugs::{DrugService, Enrichment};
pub use error::{Result, RxListError};
pub use medications::{MedicationList, MedicationStore};
pub use models::{DrugRecord, MedicationListItem, UserId};
pub use rate_limit::{
    MemoryRateLimitStore, RateDecision, RateLimitStore, RateLimiter, SqliteRateLimitStore,
};
pub use rxnorm::{RxNormClient, TerminologySource};

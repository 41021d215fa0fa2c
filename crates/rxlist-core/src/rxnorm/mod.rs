//! RxNorm terminology lookups.
//!
//! - [`TerminologySource`] - the three lookups the rest of the core needs
//! - [`RxNormClient`] - implementation against the RxNav REST API
//! - [`types`] - RxNav response payloads and their conversion to
//!   [`DrugRecord`]

mod client;
pub mod types;

pub use client::RxNormClient;

use crate::models::DrugRecord;
use crate::Result;
use async_trait::async_trait;

/// Lookups against an external drug terminology service.
///
/// Every method performs at most one outbound request and never retries.
/// "Not found" is a value, not an error: errors are reserved for transport
/// failures and responses that cannot be understood.
#[async_trait]
pub trait TerminologySource: Send + Sync {
    /// Whether the service knows the identifier.
    async fn check_exists(&self, rxcui: &str) -> Result<bool>;

    /// Fetch the name, ingredients and dose form groups for an identifier.
    ///
    /// Returns `Ok(None)` when the service reports the identifier unknown.
    async fn fetch_details(&self, rxcui: &str) -> Result<Option<DrugRecord>>;

    /// Identifiers of branded drugs matching a name, in upstream order.
    async fn find_candidates(&self, name: &str) -> Result<Vec<String>>;
}

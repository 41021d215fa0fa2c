//! Storage seam behind `ResultCache`.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A stored RxNorm payload and its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized JSON of the cached result.
    pub value: Vec<u8>,
    pub cached_at: DateTime<Utc>,
    /// Reads at or after this instant miss.
    pub expires_at: DateTime<Utc>,
}

/// Byte store for search results, drug details and existence checks.
///
/// Entries are addressed by a namespace (`drug_search`, `drug_details`,
/// `rxcui_validation`) and a key within it. Methods are blocking; both
/// backends answer from memory or one SQLite statement.
pub trait CacheBackend: Send + Sync {
    /// Payload under `namespace`/`key` unless missing or past its TTL.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_entry(namespace, key)?.map(|e| e.value))
    }

    fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>>;

    /// Store `value` for `ttl`, replacing whatever the key held.
    fn set(&self, namespace: &str, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Drop one entry. Returns whether it was present.
    fn invalidate(&self, namespace: &str, key: &str) -> Result<bool>;

    /// Delete every entry whose TTL has run out and return how many went.
    fn cleanup_expired(&self) -> Result<usize>;
}

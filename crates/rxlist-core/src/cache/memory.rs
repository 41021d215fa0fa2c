//! In-process cache backend.

use super::traits::{CacheBackend, CacheEntry};
use crate::config::CacheSettings;
use crate::error::Result;
use chrono::{DateTime, Utc};
use mini_moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct MemoryEntry {
    value: Vec<u8>,
    cached_at: DateTime<Utc>,
    stored_at: Instant,
    ttl: Duration,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }

    fn to_entry(&self) -> CacheEntry {
        CacheEntry {
            value: self.value.clone(),
            cached_at: self.cached_at,
            expires_at: self.cached_at + chrono::Duration::from_std(self.ttl).unwrap_or_default(),
        }
    }
}

/// Bounded in-memory cache.
///
/// Each entry carries its own deadline, checked on every read. The
/// underlying mini-moka cache additionally evicts anything older than
/// `max_ttl` and keeps at most `max_entries` entries.
pub struct MemoryCache {
    entries: Cache<(String, String), Arc<MemoryEntry>>,
}

impl MemoryCache {
    /// Create a cache sized for the default TTL.
    pub fn new() -> Self {
        Self::with_limits(CacheSettings::MEMORY_MAX_ENTRIES, CacheSettings::TTL)
    }

    /// Create a cache with explicit capacity and TTL ceiling.
    pub fn with_limits(max_entries: u64, max_ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(max_ttl)
                .build(),
        }
    }

    fn keys_where(&self, predicate: impl Fn(&MemoryEntry) -> bool) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryCache {
    fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        let cache_key = (namespace.to_string(), key.to_string());
        match self.entries.get(&cache_key) {
            Some(entry) if entry.is_expired() => {
                self.entries.invalidate(&cache_key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.to_entry())),
            None => Ok(None),
        }
    }

    fn set(&self, namespace: &str, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let entry = MemoryEntry {
            value: value.to_vec(),
            cached_at: Utc::now(),
            stored_at: Instant::now(),
            ttl,
        };
        self.entries
            .insert((namespace.to_string(), key.to_string()), Arc::new(entry));
        Ok(())
    }

    fn invalidate(&self, namespace: &str, key: &str) -> Result<bool> {
        let cache_key = (namespace.to_string(), key.to_string());
        let existed = self.entries.get(&cache_key).is_some();
        self.entries.invalidate(&cache_key);
        Ok(existed)
    }

    fn cleanup_expired(&self) -> Result<usize> {
        let keys = self.keys_where(|entry| entry.is_expired());
        for key in &keys {
            self.entries.invalidate(key);
        }
        if !keys.is_empty() {
            debug!("Cleaned up {} expired cache entries", keys.len());
        }
        Ok(keys.len())
    }
}

//! Typed memoization on top of a [`CacheBackend`].

use super::traits::CacheBackend;
use crate::config::CacheSettings;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Location of a cached value: a fixed namespace plus the raw lookup term.
///
/// Terms are used verbatim. "Aspirin" and "aspirin" are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: &'static str,
    key: String,
}

impl CacheKey {
    pub fn new(namespace: &'static str, key: impl Into<String>) -> Self {
        Self {
            namespace,
            key: key.into(),
        }
    }

    /// Key for an assembled search result list.
    pub fn search(term: &str) -> Self {
        Self::new(CacheSettings::SEARCH_NAMESPACE, term)
    }

    /// Key for a single identifier's details.
    pub fn details(rxcui: &str) -> Self {
        Self::new(CacheSettings::DETAILS_NAMESPACE, rxcui)
    }

    /// Key for an identifier existence check.
    pub fn validation(rxcui: &str) -> Self {
        Self::new(CacheSettings::VALIDATION_NAMESPACE, rxcui)
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.namespace, self.key)
    }
}

type LockMap = Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>;

/// Holds the per-key lock and drops the map slot once nobody else waits on it.
struct KeyLockGuard {
    key: CacheKey,
    locks: LockMap,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for KeyLockGuard {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.locks.lock() {
            // One reference in the map, one held by `_guard`.
            let idle = locks
                .get(&self.key)
                .map(|lock| Arc::strong_count(lock) <= 2)
                .unwrap_or(false);
            if idle {
                locks.remove(&self.key);
            }
        }
    }
}

/// Memoizes fallible async computations in a shared backend.
///
/// Cloning is cheap and clones share both the backend and the per-key
/// locks, so concurrent cold misses on one key run the computation once.
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
    locks: LockMap,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the cached value under `key`, or run `compute` and cache its result.
    ///
    /// `compute` runs at most once per call and only on a miss. Its result is
    /// stored even when empty; an `Err` is returned as-is and nothing is stored.
    /// Backend failures are logged and treated as misses.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.lookup(key) {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        let _lock = self.lock_key(key).await;

        // Another caller may have filled the entry while we waited.
        if let Some(value) = self.lookup(key) {
            debug!("Cache hit for {} after wait", key);
            return Ok(value);
        }

        debug!("Cache miss for {}", key);
        let value = compute().await?;
        self.store(key, &value, ttl);
        Ok(value)
    }

    async fn lock_key(&self, key: &CacheKey) -> KeyLockGuard {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        KeyLockGuard {
            key: key.clone(),
            locks: self.locks.clone(),
            _guard: lock.lock_owned().await,
        }
    }

    fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.backend.get(key.namespace(), key.key()) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    if let Err(e) = self.backend.invalidate(key.namespace(), key.key()) {
                        warn!("Failed to drop cache entry {}: {}", key, e);
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache error for {}, falling back to upstream: {}", key, e);
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.backend.set(key.namespace(), key.key(), &bytes, ttl) {
            warn!("Failed to cache {}: {}", key, e);
        }
    }
}

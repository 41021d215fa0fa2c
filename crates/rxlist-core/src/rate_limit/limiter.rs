//! Per-subject request limiting.

use super::store::RateLimitStore;
use crate::config::RateLimitConfig;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a rate-limited attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The attempt was recorded; `remaining` more fit in the window.
    Allowed { remaining: u32 },
    /// The subject is at its ceiling. Nothing was recorded.
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Fixed-window limiter keyed by `prefix + subject`.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_attempts: u32,
    window: Duration,
    prefix: String,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_attempts", &self.max_attempts)
            .field("window", &self.window)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Limiter for the drug search endpoint: 10 attempts per 60 seconds.
    pub fn for_search(store: Arc<dyn RateLimitStore>) -> Self {
        Self::new(
            store,
            RateLimitConfig::SEARCH_KEY_PREFIX,
            RateLimitConfig::MAX_ATTEMPTS,
            RateLimitConfig::WINDOW,
        )
    }

    pub fn new(
        store: Arc<dyn RateLimitStore>,
        prefix: impl Into<String>,
        max_attempts: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            max_attempts,
            window,
            prefix: prefix.into(),
        }
    }

    fn key(&self, subject: &str) -> String {
        format!("{}{}", self.prefix, subject)
    }

    /// Whether `subject` is still below its ceiling. Records nothing.
    pub fn allow(&self, subject: &str) -> Result<bool> {
        Ok(self.store.attempts(&self.key(subject))? < self.max_attempts)
    }

    /// Record one hit for `subject` in a window of the given length.
    pub fn record_hit(&self, subject: &str, window: Duration) -> Result<u32> {
        self.store.hit(&self.key(subject), window)
    }

    /// Check and record in one step.
    ///
    /// Rejected attempts are not counted, so a subject hammering the
    /// endpoint is released as soon as its first window closes.
    pub fn attempt(&self, subject: &str) -> Result<RateDecision> {
        let key = self.key(subject);

        match self.store.hit_if_below(&key, self.max_attempts, self.window)? {
            Some(count) => Ok(RateDecision::Allowed {
                remaining: self.max_attempts.saturating_sub(count),
            }),
            None => {
                let retry_after = self.store.available_in(&key)?.unwrap_or(self.window);
                warn!("Rate limit reached for {}", key);
                debug!("{} may retry in {:?}", key, retry_after);
                Ok(RateDecision::Limited { retry_after })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::{MemoryRateLimitStore, SqliteRateLimitStore};

    fn limiter() -> (Arc<MemoryRateLimitStore>, RateLimiter) {
        let store = Arc::new(MemoryRateLimitStore::new());
        (store.clone(), RateLimiter::for_search(store))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ten_attempts_then_limited() {
        let (_, limiter) = limiter();

        for i in 0..10 {
            assert_eq!(
                limiter.attempt("10.0.0.1").unwrap(),
                RateDecision::Allowed { remaining: 9 - i }
            );
        }

        let decision = limiter.attempt("10.0.0.1").unwrap();
        assert_eq!(
            decision,
            RateDecision::Limited {
                retry_after: Duration::from_secs(60)
            }
        );
        assert!(limiter.attempt("10.0.0.2").unwrap().is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_attempts_are_not_counted() {
        let (store, limiter) = limiter();

        for _ in 0..15 {
            limiter.attempt("10.0.0.1").unwrap();
        }

        assert_eq!(store.attempts("drug_search_10.0.0.1").unwrap(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_resets_after_window() {
        let (_, limiter) = limiter();

        for _ in 0..10 {
            limiter.attempt("10.0.0.1").unwrap();
        }
        assert!(!limiter.allow("10.0.0.1").unwrap());

        tokio::time::advance(Duration::from_secs(30)).await;
        match limiter.attempt("10.0.0.1").unwrap() {
            RateDecision::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(30))
            }
            other => panic!("expected limited, got {:?}", other),
        }

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.allow("10.0.0.1").unwrap());
        assert!(limiter.attempt("10.0.0.1").unwrap().is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_allow_then_record_hit() {
        let (_, limiter) = limiter();

        let mut passed = 0;
        for _ in 0..11 {
            if limiter.allow("10.0.0.1").unwrap() {
                limiter
                    .record_hit("10.0.0.1", RateLimitConfig::WINDOW)
                    .unwrap();
                passed += 1;
            }
        }

        assert_eq!(passed, 10);
    }

    #[test]
    fn test_sqlite_store_enforces_same_policy() {
        let limiter = RateLimiter::for_search(Arc::new(SqliteRateLimitStore::open_in_memory().unwrap()));

        for _ in 0..10 {
            assert!(limiter.attempt("::1").unwrap().is_allowed());
        }
        assert!(!limiter.attempt("::1").unwrap().is_allowed());

        assert!(limiter.attempt("::2").unwrap().is_allowed());
    }
}

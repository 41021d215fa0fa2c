//! Rate limit store trait.

use crate::error::Result;
use std::time::Duration;

/// Storage for fixed-window hit counters.
///
/// A window opens with the first hit on a key and lasts for the duration
/// given with that hit. Once it elapses the key reads as zero attempts and
/// the next hit opens a fresh window. Expired windows are dropped when their
/// key is touched, by the store's own periodic sweep, or by `cleanup_expired`.
pub trait RateLimitStore: Send + Sync {
    /// Hits recorded in the key's current window.
    fn attempts(&self, key: &str) -> Result<u32>;

    /// Record a hit and return the window's new count.
    fn hit(&self, key: &str, window: Duration) -> Result<u32>;

    /// Record a hit only if fewer than `max` are already recorded.
    ///
    /// The check and the write happen atomically. Returns the new count, or
    /// `None` when the key is at its ceiling (nothing is recorded then).
    fn hit_if_below(&self, key: &str, max: u32, window: Duration) -> Result<Option<u32>>;

    /// Time until the key's current window closes, `None` if no window is open.
    fn available_in(&self, key: &str) -> Result<Option<Duration>>;

    /// Forget the key's window.
    fn clear(&self, key: &str) -> Result<()>;

    /// Delete every elapsed window and return how many were removed.
    fn cleanup_expired(&self) -> Result<usize>;
}

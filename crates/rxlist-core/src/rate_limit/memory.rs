//! In-process rate limit store.

use super::store::RateLimitStore;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Sweep the whole map once it grows past this many keys.
const PRUNE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: Instant,
    window: Duration,
}

impl RateWindow {
    fn open(window: Duration) -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
            window,
        }
    }

    fn is_expired(&self) -> bool {
        self.window_start.elapsed() >= self.window
    }

    fn remaining(&self) -> Duration {
        self.window.saturating_sub(self.window_start.elapsed())
    }
}

/// Mutex-guarded map of windows.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateWindow>> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The live window for `key`, dropping it first if it has expired.
    fn live<'a>(windows: &'a mut HashMap<String, RateWindow>, key: &str) -> Option<&'a mut RateWindow> {
        if windows.get(key).is_some_and(RateWindow::is_expired) {
            windows.remove(key);
        }
        windows.get_mut(key)
    }

    fn prune(windows: &mut HashMap<String, RateWindow>) -> usize {
        let before = windows.len();
        windows.retain(|_, w| !w.is_expired());
        before - windows.len()
    }

    fn record(windows: &mut HashMap<String, RateWindow>, key: &str, window: Duration) -> u32 {
        if windows.len() >= PRUNE_THRESHOLD {
            Self::prune(windows);
        }

        if windows.get(key).is_some_and(RateWindow::is_expired) {
            windows.remove(key);
        }
        let entry = windows
            .entry(key.to_string())
            .or_insert_with(|| RateWindow::open(window));
        entry.count = entry.count.saturating_add(1);
        entry.count
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn attempts(&self, key: &str) -> Result<u32> {
        let mut windows = self.lock();
        Ok(Self::live(&mut windows, key).map_or(0, |w| w.count))
    }

    fn hit(&self, key: &str, window: Duration) -> Result<u32> {
        let mut windows = self.lock();
        Ok(Self::record(&mut windows, key, window))
    }

    fn hit_if_below(&self, key: &str, max: u32, window: Duration) -> Result<Option<u32>> {
        let mut windows = self.lock();
        let current = Self::live(&mut windows, key).map_or(0, |w| w.count);
        if current >= max {
            return Ok(None);
        }
        Ok(Some(Self::record(&mut windows, key, window)))
    }

    fn available_in(&self, key: &str) -> Result<Option<Duration>> {
        let mut windows = self.lock();
        Ok(Self::live(&mut windows, key).map(|w| w.remaining()))
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn cleanup_expired(&self) -> Result<usize> {
        Ok(Self::prune(&mut self.lock()))
    }
}

//! SQLite-based rate limit store.

use super::store::RateLimitStore;
use crate::config::DatabaseConfig;
use crate::error::{Result, RxListError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Rate limit windows persisted in SQLite.
///
/// Counters are visible to every process using the same database file.
/// Each check-and-record runs in an immediate transaction, so concurrent
/// processes cannot both pass the last free slot. Elapsed windows of other
/// keys are deleted every `DatabaseConfig::SWEEP_EVERY_WRITES` recorded hits.
pub struct SqliteRateLimitStore {
    conn: Arc<Mutex<Connection>>,
    writes: AtomicU64,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// `(count, window_start_ms, window_ms)` of a live window.
type WindowRow = (u32, i64, i64);

impl SqliteRateLimitStore {
    /// Open (or create) the store at the specified database path.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RxListError::io_with_path(e, parent))?;
        }

        let conn = Connection::open(db_path).map_err(|e| RxListError::Database {
            message: format!("Failed to open rate limit database: {}", e),
            source: Some(e),
        })?;

        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout={};",
            DatabaseConfig::BUSY_TIMEOUT_MS
        ))?;

        Self::from_connection(conn)
    }

    /// Create a private store backed by an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rate_windows (
                key TEXT PRIMARY KEY,
                count INTEGER NOT NULL,
                window_start_ms INTEGER NOT NULL,
                window_ms INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| RxListError::Database {
            message: format!("Failed to initialize rate limit schema: {}", e),
            source: Some(e),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            writes: AtomicU64::new(0),
        })
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| RxListError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }

    /// The key's window if it is still open. Expired rows are deleted.
    fn live_window(tx: &Transaction<'_>, key: &str, now: i64) -> Result<Option<WindowRow>> {
        let row: Option<WindowRow> = tx
            .query_row(
                "SELECT count, window_start_ms, window_ms FROM rate_windows WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((_, start, window)) if now >= start.saturating_add(window) => {
                tx.execute("DELETE FROM rate_windows WHERE key = ?1", params![key])?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn delete_expired(conn: &Connection, now: i64) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM rate_windows WHERE window_start_ms + window_ms <= ?1",
            params![now],
        )?;
        if deleted > 0 {
            debug!("Cleaned up {} expired rate limit windows", deleted);
        }
        Ok(deleted)
    }

    /// Record a hit, sweeping elapsed windows when the write count comes due.
    fn record(&self, tx: &Transaction<'_>, key: &str, window: Duration, now: i64) -> Result<u32> {
        let written = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if written % DatabaseConfig::SWEEP_EVERY_WRITES == 0 {
            Self::delete_expired(tx, now)?;
        }

        match Self::live_window(tx, key, now)? {
            Some((count, _, _)) => {
                let count = count.saturating_add(1);
                tx.execute(
                    "UPDATE rate_windows SET count = ?2 WHERE key = ?1",
                    params![key, count],
                )?;
                Ok(count)
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO rate_windows (key, count, window_start_ms, window_ms)
                    VALUES (?1, 1, ?2, ?3)
                    "#,
                    params![key, now, duration_millis(window)],
                )?;
                Ok(1)
            }
        }
    }

    /// Run `f` inside an immediate transaction and commit its result.
    fn with_transaction<T>(&self, f: impl FnOnce(&Transaction<'_>, i64) -> Result<T>) -> Result<T> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx, now_millis())?;
        tx.commit()?;
        Ok(value)
    }
}

impl RateLimitStore for SqliteRateLimitStore {
    fn attempts(&self, key: &str) -> Result<u32> {
        self.with_transaction(|tx, now| {
            Ok(Self::live_window(tx, key, now)?.map_or(0, |(count, _, _)| count))
        })
    }

    fn hit(&self, key: &str, window: Duration) -> Result<u32> {
        self.with_transaction(|tx, now| self.record(tx, key, window, now))
    }

    fn hit_if_below(&self, key: &str, max: u32, window: Duration) -> Result<Option<u32>> {
        self.with_transaction(|tx, now| {
            let current = Self::live_window(tx, key, now)?.map_or(0, |(count, _, _)| count);
            if current >= max {
                return Ok(None);
            }
            self.record(tx, key, window, now).map(Some)
        })
    }

    fn available_in(&self, key: &str) -> Result<Option<Duration>> {
        self.with_transaction(|tx, now| {
            Ok(Self::live_window(tx, key, now)?.map(|(_, start, window)| {
                let remaining = start.saturating_add(window).saturating_sub(now);
                Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
            }))
        })
    }

    fn clear(&self, key: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM rate_windows WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn cleanup_expired(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        Self::delete_expired(&conn, now_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_hits_accumulate() {
        let store = SqliteRateLimitStore::open_in_memory().unwrap();
        assert_eq!(store.hit("k", WINDOW).unwrap(), 1);
        assert_eq!(store.hit("k", WINDOW).unwrap(), 2);
        assert_eq!(store.attempts("k").unwrap(), 2);
        assert_eq!(store.attempts("other").unwrap(), 0);
    }

    #[test]
    fn test_hit_if_below_stops_at_ceiling() {
        let store = SqliteRateLimitStore::open_in_memory().unwrap();
        assert_eq!(store.hit_if_below("k", 2, WINDOW).unwrap(), Some(1));
        assert_eq!(store.hit_if_below("k", 2, WINDOW).unwrap(), Some(2));
        assert_eq!(store.hit_if_below("k", 2, WINDOW).unwrap(), None);
        assert_eq!(store.attempts("k").unwrap(), 2);
    }

    #[test]
    fn test_elapsed_window_starts_over() {
        let store = SqliteRateLimitStore::open_in_memory().unwrap();
        store.hit("k", Duration::ZERO).unwrap();
        assert_eq!(store.attempts("k").unwrap(), 0);
        assert!(store.available_in("k").unwrap().is_none());
        assert_eq!(store.hit("k", WINDOW).unwrap(), 1);
    }

    #[test]
    fn test_available_in_bounded_by_window() {
        let store = SqliteRateLimitStore::open_in_memory().unwrap();
        store.hit("k", WINDOW).unwrap();
        let remaining = store.available_in("k").unwrap().unwrap();
        assert!(remaining <= WINDOW);
        assert!(remaining > Duration::from_secs(50));
    }

    #[test]
    fn test_counters_shared_between_handles() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rates.sqlite");
        let first = SqliteRateLimitStore::new(&path).unwrap();
        let second = SqliteRateLimitStore::new(&path).unwrap();

        first.hit("drug_search_10.0.0.1", WINDOW).unwrap();
        assert_eq!(second.hit("drug_search_10.0.0.1", WINDOW).unwrap(), 2);
    }

    fn window_count(store: &SqliteRateLimitStore) -> i64 {
        store
            .lock_conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM rate_windows", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_cleanup_expired_deletes_elapsed_windows() {
        let store = SqliteRateLimitStore::open_in_memory().unwrap();
        store.hit("drug_search_10.0.0.1", Duration::ZERO).unwrap();
        store.hit("drug_search_10.0.0.2", Duration::ZERO).unwrap();
        store.hit("drug_search_10.0.0.3", WINDOW).unwrap();

        assert_eq!(store.cleanup_expired().unwrap(), 2);
        assert_eq!(window_count(&store), 1);
        assert_eq!(store.attempts("drug_search_10.0.0.3").unwrap(), 1);
    }

    #[test]
    fn test_hits_sweep_windows_of_other_keys() {
        let store = SqliteRateLimitStore::open_in_memory().unwrap();
        let sweep_at = DatabaseConfig::SWEEP_EVERY_WRITES;

        for i in 1..sweep_at {
            store
                .hit_if_below(&format!("drug_search_ip{}", i), 10, Duration::ZERO)
                .unwrap();
        }
        assert_eq!(window_count(&store) as u64, sweep_at - 1);

        store.hit_if_below("drug_search_live", 10, WINDOW).unwrap();
        assert_eq!(window_count(&store), 1);
    }

    #[test]
    fn test_clear() {
        let store = SqliteRateLimitStore::open_in_memory().unwrap();
        store.hit("k", WINDOW).unwrap();
        store.clear("k").unwrap();
        assert_eq!(store.attempts("k").unwrap(), 0);
    }
}

//! SQLite-based cache backend.
//!
//! Every process pointed at the same database file sees the same entries,
//! which makes this the backend for multi-process deployments.

use super::traits::{CacheBackend, CacheEntry};
use crate::config::DatabaseConfig;
use crate::error::{Result, RxListError};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// SQLite-based cache backend.
///
/// Thread-safe via internal mutex on the connection. Timestamps are stored
/// as Unix milliseconds so expiry checks compare integers. Every
/// `DatabaseConfig::SWEEP_EVERY_WRITES` writes, expired rows are deleted.
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
    writes: AtomicU64,
}

impl SqliteCache {
    /// Open (or create) a cache at the specified database path.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RxListError::Io {
                message: format!("Failed to create cache directory: {}", e),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| RxListError::Database {
            message: format!("Failed to open cache database: {}", e),
            source: Some(e),
        })?;

        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout={};",
            DatabaseConfig::BUSY_TIMEOUT_MS
        ))
        .map_err(|e| RxListError::Database {
            message: format!("Failed to set pragmas: {}", e),
            source: Some(e),
        })?;

        Self::from_connection(conn)
    }

    /// Create a private cache backed by an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let cache = Self {
            conn: Arc::new(Mutex::new(conn)),
            writes: AtomicU64::new(0),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value BLOB NOT NULL,
                cached_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            CREATE INDEX IF NOT EXISTS idx_cache_expires
                ON cache_entries(expires_at);
            "#,
        )
        .map_err(|e| RxListError::Database {
            message: format!("Failed to initialize cache schema: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| RxListError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }

    /// Number of stored entries, expired ones included.
    pub fn entry_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    fn delete_expired(conn: &Connection) -> Result<usize> {
        let now = Utc::now().timestamp_millis();

        let deleted = conn
            .execute(
                "DELETE FROM cache_entries WHERE expires_at <= ?1",
                params![now],
            )
            .map_err(|e| RxListError::Database {
                message: format!("Failed to cleanup expired entries: {}", e),
                source: Some(e),
            })?;

        if deleted > 0 {
            debug!("Cleaned up {} expired cache entries", deleted);
        }

        Ok(deleted)
    }
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

impl CacheBackend for SqliteCache {
    fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock_conn()?;
        let now = Utc::now().timestamp_millis();

        let row: Option<(Vec<u8>, i64, i64)> = conn
            .query_row(
                r#"
                SELECT value, cached_at, expires_at
                FROM cache_entries
                WHERE namespace = ?1 AND key = ?2 AND expires_at > ?3
                "#,
                params![namespace, key, now],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| RxListError::Database {
                message: format!("Failed to query cache entry: {}", e),
                source: Some(e),
            })?;

        Ok(row.map(|(value, cached_at, expires_at)| CacheEntry {
            value,
            cached_at: from_millis(cached_at),
            expires_at: from_millis(expires_at),
        }))
    }

    fn set(&self, namespace: &str, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let conn = self.lock_conn()?;

        let now = Utc::now().timestamp_millis();
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_millis);

        conn.execute(
            r#"
            INSERT OR REPLACE INTO cache_entries
            (namespace, key, value, cached_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![namespace, key, value, now, expires_at],
        )
        .map_err(|e| RxListError::Database {
            message: format!("Failed to set cache entry: {}", e),
            source: Some(e),
        })?;

        let written = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if written % DatabaseConfig::SWEEP_EVERY_WRITES == 0 {
            Self::delete_expired(&conn)?;
        }

        Ok(())
    }

    fn invalidate(&self, namespace: &str, key: &str) -> Result<bool> {
        let conn = self.lock_conn()?;

        let deleted = conn
            .execute(
                "DELETE FROM cache_entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
            )
            .map_err(|e| RxListError::Database {
                message: format!("Failed to invalidate cache entry: {}", e),
                source: Some(e),
            })?;

        Ok(deleted > 0)
    }

    fn cleanup_expired(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        Self::delete_expired(&conn)
    }
}

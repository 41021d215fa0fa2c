//! SQLite-backed medication list storage.

use crate::config::DatabaseConfig;
use crate::models::{DrugRecord, MedicationListItem, UserId};
use crate::{Result, RxListError};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const ITEM_COLUMNS: &str = "id, user_id, rxcui, drug_name, base_names, dose_form_group_names, created_at, updated_at";

/// Medication list entries, one per `(user, rxcui)` pair.
///
/// Name lists are stored as JSON arrays and timestamps as RFC 3339 text.
pub struct MedicationStore {
    conn: Arc<Mutex<Connection>>,
}

impl MedicationStore {
    /// Open (or create) the store at a specific path.
    ///
    /// Creates the database and parent directories if they don't exist.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| RxListError::Io {
                    message: format!("Failed to create database directory: {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA busy_timeout={};\n\
             PRAGMA synchronous=NORMAL;",
            DatabaseConfig::BUSY_TIMEOUT_MS,
        ))?;
        Self::from_connection(conn)
    }

    /// Create a store backed by an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS user_medications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                rxcui TEXT NOT NULL,
                drug_name TEXT NOT NULL,
                base_names TEXT NOT NULL DEFAULT '[]',
                dose_form_group_names TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, rxcui)
            );

            CREATE INDEX IF NOT EXISTS idx_user_medications_user
                ON user_medications(user_id);",
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RxListError::Database {
            message: "Failed to acquire medication store lock".to_string(),
            source: None,
        })
    }

    /// All entries for `user`, oldest first.
    pub fn list(&self, user: UserId) -> Result<Vec<MedicationListItem>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM user_medications WHERE user_id = ?1 ORDER BY id ASC",
            ITEM_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user.0], item_from_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    pub fn exists(&self, user: UserId, rxcui: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM user_medications WHERE user_id = ?1 AND rxcui = ?2",
                params![user.0, rxcui],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, user: UserId, rxcui: &str) -> Result<Option<MedicationListItem>> {
        let conn = self.lock_conn()?;
        let item = conn
            .query_row(
                &format!(
                    "SELECT {} FROM user_medications WHERE user_id = ?1 AND rxcui = ?2",
                    ITEM_COLUMNS
                ),
                params![user.0, rxcui],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Insert a snapshot of `record` into `user`'s list.
    ///
    /// Fails with [`RxListError::Conflict`] if the pair is already stored.
    pub fn add(&self, user: UserId, record: &DrugRecord) -> Result<MedicationListItem> {
        let conn = self.lock_conn()?;
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        let inserted = conn.execute(
            "INSERT INTO user_medications
             (user_id, rxcui, drug_name, base_names, dose_form_group_names, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                user.0,
                record.rxcui,
                record.drug_name,
                serde_json::to_string(&record.base_names)?,
                serde_json::to_string(&record.dose_form_group_names)?,
                stamp,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                return Err(RxListError::Conflict {
                    rxcui: record.rxcui.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Added medication {} for user {}", record.rxcui, user);

        Ok(MedicationListItem {
            id: conn.last_insert_rowid(),
            user_id: user,
            rxcui: record.rxcui.clone(),
            drug_name: record.drug_name.clone(),
            base_names: record.base_names.clone(),
            dose_form_group_names: record.dose_form_group_names.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Delete `rxcui` from `user`'s list.
    ///
    /// Fails with [`RxListError::NotFound`] if the pair is not stored.
    pub fn remove(&self, user: UserId, rxcui: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let rows = conn.execute(
            "DELETE FROM user_medications WHERE user_id = ?1 AND rxcui = ?2",
            params![user.0, rxcui],
        )?;

        if rows == 0 {
            return Err(RxListError::NotFound {
                rxcui: rxcui.to_string(),
            });
        }

        debug!("Removed medication {} for user {}", rxcui, user);
        Ok(())
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn names_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<MedicationListItem> {
    Ok(MedicationListItem {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        rxcui: row.get(2)?,
        drug_name: row.get(3)?,
        base_names: names_column(row, 4)?,
        dose_form_group_names: names_column(row, 5)?,
        created_at: time_column(row, 6)?,
        updated_at: time_column(row, 7)?,
    })
}

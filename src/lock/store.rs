/// CAS keyed-record storage for lock records
///
/// The lock manager only needs three primitives from its store: atomic
/// create-if-absent, conditional update, and conditional delete. Any store
/// offering those suffices; no relational semantics are assumed. Ships with
/// an in-memory implementation and a SQLite one.

use crate::lock::types::LockRecord;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keyed-record store with compare-and-swap primitives
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Current record for the workflow id, if any
    async fn get(&self, workflow_id: &str) -> Result<Option<LockRecord>>;

    /// Create the record iff no record exists for its workflow id.
    /// Returns false when the key is already taken (the caller lost a race).
    async fn try_insert(&self, record: &LockRecord) -> Result<bool>;

    /// Replace the record iff the stored holder still matches
    /// `expected_holder`. Returns false when the record changed or vanished
    /// between the caller's read and this write.
    async fn compare_and_update(&self, expected_holder: &str, record: &LockRecord) -> Result<bool>;

    /// Delete the record, optionally only when the stored holder matches.
    /// Returns false when nothing matched (already reaped or taken over).
    async fn delete(&self, workflow_id: &str, expected_holder: Option<&str>) -> Result<bool>;
}

/// In-memory lock store
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    records: RwLock<HashMap<String, LockRecord>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn get(&self, workflow_id: &str) -> Result<Option<LockRecord>> {
        Ok(self.records.read().await.get(workflow_id).cloned())
    }

    async fn try_insert(&self, record: &LockRecord) -> Result<bool> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.workflow_id) {
            return Ok(false);
        }
        records.insert(record.workflow_id.clone(), record.clone());
        Ok(true)
    }

    async fn compare_and_update(&self, expected_holder: &str, record: &LockRecord) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.get(&record.workflow_id) {
            Some(current) if current.holder_id == expected_holder => {
                records.insert(record.workflow_id.clone(), record.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, workflow_id: &str, expected_holder: Option<&str>) -> Result<bool> {
        let mut records = self.records.write().await;
        match (records.get(workflow_id), expected_holder) {
            (Some(current), Some(holder)) if current.holder_id != holder => Ok(false),
            (Some(_), _) => {
                records.remove(workflow_id);
                Ok(true)
            }
            (None, _) => Ok(false),
        }
    }
}

/// SQLite-backed lock store
///
/// One uniquely-keyed row per workflow id; the primary-key constraint gives
/// atomic create-if-absent and holder-conditioned UPDATE/DELETE give the
/// CAS behavior. Timestamps are stored as RFC 3339 text.
#[derive(Debug, Clone)]
pub struct SqliteLockStore {
    pool: SqlitePool,
}

impl SqliteLockStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the lock table. Safe to call multiple times.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_locks (
                workflow_id TEXT PRIMARY KEY,
                holder_id TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                requesting_id TEXT,
                requesting_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<LockRecord> {
    let updated_at: String = row.try_get("updated_at")?;
    let requesting_at: Option<String> = row.try_get("requesting_at")?;
    Ok(LockRecord {
        workflow_id: row.try_get("workflow_id")?,
        holder_id: row.try_get("holder_id")?,
        updated_at: parse_timestamp(&updated_at)?,
        requesting_id: row.try_get("requesting_id")?,
        requesting_at: requesting_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[async_trait]
impl LockStore for SqliteLockStore {
    async fn get(&self, workflow_id: &str) -> Result<Option<LockRecord>> {
        let row = sqlx::query(
            "SELECT workflow_id, holder_id, updated_at, requesting_id, requesting_at \
             FROM workflow_locks WHERE workflow_id = ?",
        )
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn try_insert(&self, record: &LockRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO workflow_locks (workflow_id, holder_id, updated_at, requesting_id, requesting_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(workflow_id) DO NOTHING
            "#,
        )
        .bind(&record.workflow_id)
        .bind(&record.holder_id)
        .bind(record.updated_at.to_rfc3339())
        .bind(&record.requesting_id)
        .bind(record.requesting_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_update(&self, expected_holder: &str, record: &LockRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE workflow_locks
            SET holder_id = ?, updated_at = ?, requesting_id = ?, requesting_at = ?
            WHERE workflow_id = ? AND holder_id = ?
            "#,
        )
        .bind(&record.holder_id)
        .bind(record.updated_at.to_rfc3339())
        .bind(&record.requesting_id)
        .bind(record.requesting_at.map(|t| t.to_rfc3339()))
        .bind(&record.workflow_id)
        .bind(expected_holder)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, workflow_id: &str, expected_holder: Option<&str>) -> Result<bool> {
        let result = match expected_holder {
            Some(holder) => {
                sqlx::query("DELETE FROM workflow_locks WHERE workflow_id = ? AND holder_id = ?")
                    .bind(workflow_id)
                    .bind(holder)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM workflow_locks WHERE workflow_id = ?")
                    .bind(workflow_id)
                    .execute(&self.pool)
                    .await?
            }
        };

        Ok(result.rows_affected() == 1)
    }
}

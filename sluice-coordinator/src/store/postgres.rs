//! PostgreSQL backend
//!
//! Entries live in the `kv_entries` table created by
//! [`run_migrations`](crate::db::run_migrations). A commit runs in one
//! SERIALIZABLE transaction: guarded rows are re-read `FOR UPDATE`, and any
//! revision mismatch, serialization failure or duplicate insert is reported as
//! a conflict so the caller retries.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::{CommitOutcome, EntryKey, KvBackend, ReadGuard, Result, StoreError, Versioned};

/// SQLSTATE codes that mean "lost a race, try again"
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed [`KvBackend`]
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn try_commit(
        &self,
        guards: &[ReadGuard],
        writes: &[(EntryKey, Value)],
    ) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        for guard in guards {
            let current = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT revision
                FROM kv_entries
                WHERE collection = $1 AND key = $2
                FOR UPDATE
                "#,
            )
            .bind(&guard.key.collection)
            .bind(&guard.key.key)
            .fetch_optional(&mut *tx)
            .await?;

            if current != guard.revision {
                tx.rollback().await?;
                return Ok(CommitOutcome::Conflict);
            }
        }

        for (key, value) in writes {
            sqlx::query(
                r#"
                INSERT INTO kv_entries (collection, key, value, revision, updated_at)
                VALUES ($1, $2, $3, 1, NOW())
                ON CONFLICT (collection, key) DO UPDATE
                SET value = EXCLUDED.value,
                    revision = kv_entries.revision + 1,
                    updated_at = NOW()
                "#,
            )
            .bind(&key.collection)
            .bind(&key.key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(CommitOutcome::Committed)
    }
}

#[async_trait]
impl KvBackend for PgBackend {
    async fn read(&self, key: &EntryKey) -> Result<Option<Versioned>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT value, revision
            FROM kv_entries
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(&key.collection)
        .bind(&key.key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn commit(
        &self,
        guards: &[ReadGuard],
        writes: &[(EntryKey, Value)],
    ) -> Result<CommitOutcome> {
        match self.try_commit(guards, writes).await {
            Err(StoreError::Database(err)) if is_conflict(&err) => {
                tracing::debug!("Commit lost a race in the database: {}", err);
                Ok(CommitOutcome::Conflict)
            }
            other => other,
        }
    }
}

fn is_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | UNIQUE_VIOLATION)
        ),
        _ => false,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct EntryRow {
    value: Value,
    revision: i64,
}

impl From<EntryRow> for Versioned {
    fn from(row: EntryRow) -> Self {
        Versioned {
            value: row.value,
            revision: row.revision,
        }
    }
}

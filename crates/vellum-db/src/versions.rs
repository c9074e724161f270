//! Append-only version ledger for note history.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use vellum_core::{new_v7, AppendVersionRequest, Error, NoteVersion, Result, VersionRepository};

/// PostgreSQL-backed version ledger.
///
/// Numbering is dense per note and starts at 1. The unique index on
/// `(note_id, version_number)` rejects any duplicate append that slips past
/// the row lock held by lifecycle transactions.
#[derive(Debug, Clone)]
pub struct PgVersionRepository {
    pool: PgPool,
}

impl PgVersionRepository {
    /// Create a new repository backed by the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionRepository for PgVersionRepository {
    async fn next_version_number(&self, note_id: Uuid) -> Result<i32> {
        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM note_version WHERE note_id = $1",
        )
        .bind(note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(next)
    }

    async fn append(&self, req: AppendVersionRequest) -> Result<NoteVersion> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let version = self.append_tx(&mut tx, req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(version)
    }

    async fn fetch(&self, note_id: Uuid, version_number: i32) -> Result<Option<NoteVersion>> {
        let version = sqlx::query_as::<_, NoteVersion>(
            "SELECT id, note_id, version_number, content_snapshot, editor_id, created_at_utc
             FROM note_version WHERE note_id = $1 AND version_number = $2",
        )
        .bind(note_id)
        .bind(version_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(version)
    }

    async fn list(&self, note_id: Uuid) -> Result<Vec<NoteVersion>> {
        let versions = sqlx::query_as::<_, NoteVersion>(
            "SELECT id, note_id, version_number, content_snapshot, editor_id, created_at_utc
             FROM note_version WHERE note_id = $1 ORDER BY version_number ASC",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(versions)
    }

    async fn purge(&self, note_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM note_version WHERE note_id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}

/// Transaction-aware variants of the ledger operations.
///
/// The read-then-append pair only produces gap-free numbering when both run
/// inside one transaction that already holds the note row lock.
impl PgVersionRepository {
    /// Next version number for a note, computed within a transaction.
    pub async fn next_version_number_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
    ) -> Result<i32> {
        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM note_version WHERE note_id = $1",
        )
        .bind(note_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(next)
    }

    /// Append an immutable snapshot within a transaction.
    pub async fn append_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: AppendVersionRequest,
    ) -> Result<NoteVersion> {
        let version_id = new_v7();
        let now = Utc::now();

        let version = sqlx::query_as::<_, NoteVersion>(
            r#"
            INSERT INTO note_version (id, note_id, version_number, content_snapshot, editor_id, created_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, note_id, version_number, content_snapshot, editor_id, created_at_utc
            "#,
        )
        .bind(version_id)
        .bind(req.note_id)
        .bind(req.version_number)
        .bind(&req.content_snapshot)
        .bind(req.editor_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("idx_note_version_number") {
                    return Error::DuplicateVersion {
                        note_id: req.note_id,
                        version_number: req.version_number,
                    };
                }
            }
            Error::Database(e)
        })?;

        Ok(version)
    }

    /// Fetch a single version within a transaction.
    pub async fn fetch_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        version_number: i32,
    ) -> Result<Option<NoteVersion>> {
        let version = sqlx::query_as::<_, NoteVersion>(
            "SELECT id, note_id, version_number, content_snapshot, editor_id, created_at_utc
             FROM note_version WHERE note_id = $1 AND version_number = $2",
        )
        .bind(note_id)
        .bind(version_number)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(version)
    }

    /// Delete all versions for a note within a transaction.
    pub async fn purge_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM note_version WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}

//! Note repository with owner-scoped access.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use vellum_core::{
    new_v7, CreateNoteRequest, Error, Note, NoteRepository, Result, UpdateNoteRequest,
};

/// PostgreSQL-backed note repository.
///
/// Every query carries the owner in its WHERE clause, so a note that exists
/// but belongs to someone else is indistinguishable from a missing one.
#[derive(Debug, Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    /// Create a new repository backed by the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let note_id = new_v7();
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO note (id, title, content, owner_id, created_at_utc, updated_at_utc)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, title, content, owner_id, created_at_utc, updated_at_utc
            "#,
        )
        .bind(note_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.owner_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note)
    }

    async fn fetch(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            "SELECT id, title, content, owner_id, created_at_utc, updated_at_utc
             FROM note WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        note.ok_or(Error::NoteNotFound(id))
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        // UUIDv7 primary keys are time-ordered, so this is creation order.
        let notes = sqlx::query_as::<_, Note>(
            "SELECT id, title, content, owner_id, created_at_utc, updated_at_utc
             FROM note WHERE owner_id = $1 ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(notes)
    }

    async fn update(&self, id: Uuid, owner_id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note = self.update_tx(&mut tx, id, owner_id, req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.delete_tx(&mut tx, id, owner_id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}

/// Transaction-aware variants of the note operations.
///
/// These run against a caller-owned transaction so that version snapshots
/// and the note write commit or roll back together.
impl PgNoteRepository {
    /// Fetch a note and lock its row for the rest of the transaction.
    ///
    /// Concurrent lifecycle operations on the same note queue up behind this
    /// lock, which keeps version numbering race-free.
    pub async fn fetch_for_update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            "SELECT id, title, content, owner_id, created_at_utc, updated_at_utc
             FROM note WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        note.ok_or(Error::NoteNotFound(id))
    }

    /// Overwrite title and content within a transaction, refreshing
    /// `updated_at_utc`.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        owner_id: Uuid,
        req: UpdateNoteRequest,
    ) -> Result<Note> {
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE note
            SET title = $3, content = $4, updated_at_utc = $5
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, content, owner_id, created_at_utc, updated_at_utc
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(now)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        note.ok_or(Error::NoteNotFound(id))
    }

    /// Delete a note row within a transaction.
    ///
    /// Version rows still referencing the note make this fail with a foreign
    /// key error; callers purge the ledger first.
    pub async fn delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }

        Ok(())
    }
}

//! Transactional note lifecycle: create, update, delete, restore.
//!
//! The repositories in this crate expose single-table operations. The
//! lifecycle layer composes them into the multi-step flows that must be
//! atomic: an update snapshots the note before overwriting it, a delete
//! purges the version ledger before removing the row, and a restore backs
//! up the current content before rewinding it.
//!
//! Every flow that touches the ledger starts by locking the note row with
//! `SELECT ... FOR UPDATE`. Concurrent edits to the same note serialize on
//! that lock, so the read-then-increment version numbering never races.

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use vellum_core::{
    AppendVersionRequest, CreateNoteRequest, Error, Note, NoteRepository, NoteVersion, Result,
    UpdateNoteRequest, VersionRepository,
};

use crate::notes::PgNoteRepository;
use crate::versions::PgVersionRepository;

/// Coordinates note writes with their version bookkeeping.
#[derive(Debug, Clone)]
pub struct NoteLifecycle {
    pool: PgPool,
    notes: PgNoteRepository,
    versions: PgVersionRepository,
}

impl NoteLifecycle {
    /// Create a new lifecycle controller backed by the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            versions: PgVersionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a note.
    ///
    /// No version row is written here. The ledger stays empty until the
    /// first update snapshots the original content as version 1.
    pub async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        self.notes.insert(req).await
    }

    /// Update a note, preserving its pre-update content in the ledger.
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        req: UpdateNoteRequest,
    ) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let current = self.notes.fetch_for_update_tx(&mut tx, id, owner_id).await?;
        let version_number = self.versions.next_version_number_tx(&mut tx, id).await?;

        self.versions
            .append_tx(
                &mut tx,
                AppendVersionRequest {
                    note_id: id,
                    version_number,
                    content_snapshot: current.content,
                    editor_id: owner_id,
                },
            )
            .await?;

        let updated = self.notes.update_tx(&mut tx, id, owner_id, req).await?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "lifecycle",
            op = "update",
            note_id = %id,
            version_number,
            "Note updated with snapshot recorded"
        );
        Ok(updated)
    }

    /// Delete a note together with its entire version history.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        self.notes.fetch_for_update_tx(&mut tx, id, owner_id).await?;
        let purged = self.versions.purge_tx(&mut tx, id).await?;
        self.notes.delete_tx(&mut tx, id, owner_id).await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "lifecycle",
            op = "delete",
            note_id = %id,
            versions_purged = purged,
            "Note deleted"
        );
        Ok(())
    }

    /// Rewind a note's content to a previous version.
    ///
    /// The current content is backed up as a new version first, so a restore
    /// is itself undoable. Only content rewinds; the title keeps whatever
    /// value it had before the restore.
    pub async fn restore(&self, id: Uuid, owner_id: Uuid, version_number: i32) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let current = self.notes.fetch_for_update_tx(&mut tx, id, owner_id).await?;

        let target = self
            .versions
            .fetch_tx(&mut tx, id, version_number)
            .await?
            .ok_or(Error::VersionNotFound {
                note_id: id,
                version_number,
            })?;

        let backup_number = self.versions.next_version_number_tx(&mut tx, id).await?;
        self.versions
            .append_tx(
                &mut tx,
                AppendVersionRequest {
                    note_id: id,
                    version_number: backup_number,
                    content_snapshot: current.content,
                    editor_id: owner_id,
                },
            )
            .await?;

        let restored = self
            .notes
            .update_tx(
                &mut tx,
                id,
                owner_id,
                UpdateNoteRequest {
                    title: current.title,
                    content: target.content_snapshot,
                },
            )
            .await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "lifecycle",
            op = "restore",
            note_id = %id,
            version_number,
            backup_number,
            "Note restored to earlier version"
        );
        Ok(restored)
    }

    /// Fetch a single version of a note, enforcing ownership via the note.
    pub async fn get_version(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
        version_number: i32,
    ) -> Result<NoteVersion> {
        self.notes.fetch(note_id, owner_id).await?;

        self.versions
            .fetch(note_id, version_number)
            .await?
            .ok_or(Error::VersionNotFound {
                note_id,
                version_number,
            })
    }

    /// List all versions of a note, enforcing ownership via the note.
    pub async fn list_versions(&self, note_id: Uuid, owner_id: Uuid) -> Result<Vec<NoteVersion>> {
        self.notes.fetch(note_id, owner_id).await?;
        self.versions.list(note_id).await
    }
}

//! Core traits for vellum abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. The Postgres
//! implementations live in `vellum-db`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Request for creating a new user.
///
/// Callers hash the password before constructing this; the repository never
/// sees plaintext credentials.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A duplicate email maps to `Error::Conflict`.
    async fn insert(&self, req: CreateUserRequest) -> Result<User>;

    /// Fetch a user by ID.
    async fn fetch(&self, id: Uuid) -> Result<Option<User>>;

    /// Fetch a user by email (login lookup).
    async fn fetch_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Check whether an email is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
}

/// Request for overwriting a note's title and content.
#[derive(Debug, Clone)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub content: String,
}

/// Repository for note CRUD operations.
///
/// Every lookup and mutation is scoped by `(id, owner_id)`: a note owned by
/// someone else behaves exactly like a note that does not exist.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by ID.
    async fn fetch(&self, id: Uuid, owner_id: Uuid) -> Result<Note>;

    /// List all notes for an owner.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Note>>;

    /// Overwrite title and content, refreshing `updated_at_utc`.
    ///
    /// This does not record a version. Callers that need the edit preserved
    /// must append the pre-update snapshot to the version ledger first; the
    /// lifecycle layer does both inside one transaction.
    async fn update(&self, id: Uuid, owner_id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Delete a note row.
    ///
    /// Dependent versions are not cascaded here; callers purge the ledger
    /// first (the lifecycle layer does both inside one transaction).
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()>;
}

// =============================================================================
// VERSION REPOSITORY
// =============================================================================

/// Request for appending a version snapshot to a note's ledger.
#[derive(Debug, Clone)]
pub struct AppendVersionRequest {
    pub note_id: Uuid,
    pub version_number: i32,
    pub content_snapshot: String,
    pub editor_id: Uuid,
}

/// Repository for the per-note version ledger.
///
/// Version rows are append-only. Ownership is not checked here; callers
/// reach the ledger through the parent note, which carries the owner scope.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Next version number for a note: 1 if none exist, else max + 1.
    async fn next_version_number(&self, note_id: Uuid) -> Result<i32>;

    /// Append an immutable snapshot. A `(note_id, version_number)` collision
    /// maps to `Error::DuplicateVersion`.
    async fn append(&self, req: AppendVersionRequest) -> Result<NoteVersion>;

    /// Fetch a single version of a note.
    async fn fetch(&self, note_id: Uuid, version_number: i32) -> Result<Option<NoteVersion>>;

    /// List all versions of a note, ascending by version number.
    async fn list(&self, note_id: Uuid) -> Result<Vec<NoteVersion>>;

    /// Delete all versions for a note, returning the number removed.
    async fn purge(&self, note_id: Uuid) -> Result<u64>;
}

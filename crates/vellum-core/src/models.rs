//! Core data models for vellum.
//!
//! These types are shared across all vellum crates and represent the core
//! domain entities: users, notes, and note versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account.
///
/// The password hash is carried for credential verification but is never
/// serialized into API responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at_utc: DateTime<Utc>,
}

/// A note owned by a single user.
///
/// `updated_at_utc` is refreshed on every content mutation (update and
/// restore), never on reads.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// An immutable snapshot of note content at a moment in time.
///
/// Versions store full content, not diffs. Rows are never updated after
/// insertion and are removed only when the parent note is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteVersion {
    pub id: Uuid,
    pub note_id: Uuid,
    pub version_number: i32,
    pub content_snapshot: String,
    pub editor_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
}

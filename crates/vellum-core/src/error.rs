//! Error types for vellum.

use thiserror::Error;

/// Result type alias using vellum's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vellum operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Note not found, or not owned by the requesting user. The two cases
    /// are deliberately indistinguishable so that probing for other users'
    /// note IDs reveals nothing.
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Version not found for the given note
    #[error("Version {version_number} not found for note {note_id}")]
    VersionNotFound {
        note_id: uuid::Uuid,
        version_number: i32,
    },

    /// A version with this number already exists for the note. Writers
    /// serialize on the note row, so hitting this means the lock was
    /// bypassed somewhere.
    #[error("Version {version_number} already exists for note {note_id}")]
    DuplicateVersion {
        note_id: uuid::Uuid,
        version_number: i32,
    },

    /// Unique constraint conflict (e.g. email already registered)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

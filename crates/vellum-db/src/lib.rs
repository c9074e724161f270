//! # vellum-db
//!
//! PostgreSQL database layer for vellum.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for users, notes, and version history
//! - A transactional lifecycle controller that keeps note writes and their
//!   version bookkeeping atomic
//!
//! ## Example
//!
//! ```rust,ignore
//! use vellum_db::{CreateNoteRequest, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/vellum").await?;
//!
//!     let note = db.lifecycle.create(CreateNoteRequest {
//!         owner_id,
//!         title: "First note".to_string(),
//!         content: "Hello, world!".to_string(),
//!     }).await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```
pub mod lifecycle;
pub mod notes;
pub mod pool;
pub mod users;
pub mod versions;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use vellum_core::*;

// Re-export repository implementations
pub use lifecycle::NoteLifecycle;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use users::PgUserRepository;
pub use versions::PgVersionRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User account repository.
    pub users: PgUserRepository,
    /// Note repository for owner-scoped CRUD.
    pub notes: PgNoteRepository,
    /// Version ledger repository.
    pub versions: PgVersionRepository,
    /// Transactional lifecycle controller for versioned note writes.
    pub lifecycle: NoteLifecycle,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            versions: PgVersionRepository::new(pool.clone()),
            lifecycle: NoteLifecycle::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Round-trip a trivial query to check that the database is reachable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

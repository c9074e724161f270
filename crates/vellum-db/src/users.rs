//! User account repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use vellum_core::{new_v7, CreateUserRequest, Error, Result, User, UserRepository};

/// PostgreSQL-backed user repository.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new repository backed by the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, req: CreateUserRequest) -> Result<User> {
        let user_id = new_v7();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO app_user (id, username, email, password_hash, created_at_utc)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, created_at_utc
            "#,
        )
        .bind(user_id)
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Unique violation on email maps to a conflict the API can
            // surface as a registration error.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("idx_app_user_email") {
                    return Error::Conflict("Email already registered".to_string());
                }
            }
            Error::Database(e)
        })?;

        Ok(user)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at_utc
             FROM app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(user)
    }

    async fn fetch_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at_utc
             FROM app_user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM app_user WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(exists)
    }
}

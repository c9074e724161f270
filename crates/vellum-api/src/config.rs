//! Runtime configuration, loaded from the environment once at startup.

use std::str::FromStr;

use vellum_auth::{Algorithm, DEFAULT_TOKEN_TTL_MINUTES};
use vellum_core::{Error, Result};

/// Origins allowed by CORS when `ALLOWED_ORIGINS` is not set.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Process configuration.
///
/// The three values without defaults (`DATABASE_URL`, `SECRET_KEY`,
/// `ALGORITHM`) abort startup when missing. The server never falls back to a
/// built-in signing secret or database.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Token signing secret (`SECRET_KEY`).
    pub secret_key: String,
    /// Token signing algorithm (`ALGORITHM`).
    pub algorithm: Algorithm,
    /// Token lifetime in minutes (`ACCESS_TOKEN_EXPIRE_MINUTES`).
    pub access_token_expire_minutes: i64,
    /// Comma-separated CORS origin whitelist (`ALLOWED_ORIGINS`).
    pub allowed_origins: String,
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Separated from [`AppConfig::from_env`] so tests can drive it without
    /// mutating process-wide environment variables.
    fn load<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = require(&var, "DATABASE_URL")?;
        let secret_key = require(&var, "SECRET_KEY")?;
        let algorithm = Algorithm::from_str(require(&var, "ALGORITHM")?.trim())
            .map_err(|e| Error::Config(e.to_string()))?;

        let access_token_expire_minutes = var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);

        let allowed_origins =
            var("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .unwrap_or(8000);

        Ok(Self {
            database_url,
            secret_key,
            algorithm,
            access_token_expire_minutes,
            allowed_origins,
            host,
            port,
        })
    }
}

/// Fetch a required variable, rejecting empty and whitespace-only values.
fn require<F>(var: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} must be set", name))),
    }
}

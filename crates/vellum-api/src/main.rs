//! vellum-api - HTTP API server for vellum

mod config;

use std::net::SocketAddr;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use vellum_auth::{AuthError, TokenSigner};
use vellum_core::{
    CreateNoteRequest, CreateUserRequest, NoteRepository, UpdateNoteRequest, User, UserRepository,
};
use vellum_db::{log_pool_metrics, Database};

use config::AppConfig;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so request IDs sort chronologically in
/// logs and stay useful for tracing a request across restarts.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// CORS CONFIGURATION HELPER
// =============================================================================

/// Parse a comma-separated CORS origin whitelist into header values.
///
/// Origins that fail header-value parsing are skipped with a warning rather
/// than aborting startup. An empty or whitespace-only list falls back to the
/// development defaults. Wildcards are never accepted; the browser-facing
/// policy is always an explicit list.
fn parse_allowed_origins(origins_str: &str) -> Vec<HeaderValue> {
    if origins_str.trim().is_empty() {
        // Default origins
        return vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
struct AppState {
    db: Database,
    /// Signs and validates bearer tokens.
    signer: TokenSigner,
    /// Lifetime of tokens issued at login.
    token_ttl: chrono::Duration,
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Extractor that rejects the request unless it carries a valid bearer token.
///
/// The token subject must still resolve to a live user row; a token for a
/// deleted account is rejected the same way as a bad token.
struct RequireAuth {
    user: User,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let token = match auth_header {
            Some(value) if value.starts_with("Bearer ") => {
                value.trim_start_matches("Bearer ").trim()
            }
            _ => {
                return Err(ApiError::Unauthorized(
                    "Authentication required".to_string(),
                ));
            }
        };

        let subject = state.signer.validate(token)?;

        let user = state
            .db
            .users
            .fetch(subject)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown token subject".to_string()))?;

        Ok(RequireAuth { user })
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

/// API error type that maps onto HTTP status codes.
#[derive(Debug)]
enum ApiError {
    /// Database or other storage failure (500)
    Database(vellum_core::Error),
    /// Non-storage server failure, e.g. hashing or signing (500)
    Internal(String),
    /// Missing, invalid, or expired credentials (401)
    Unauthorized(String),
    /// Resource absent or owned by someone else (404)
    NotFound(String),
    /// Request was understood but is not acceptable (400)
    BadRequest(String),
    /// State conflict (409)
    Conflict(String),
}

impl From<vellum_core::Error> for ApiError {
    fn from(err: vellum_core::Error) -> Self {
        match err {
            // The message never says whether the note exists under another
            // owner.
            vellum_core::Error::NoteNotFound(_) => {
                ApiError::NotFound("Note not found".to_string())
            }
            vellum_core::Error::VersionNotFound { version_number, .. } => {
                ApiError::NotFound(format!("Version {} not found", version_number))
            }
            vellum_core::Error::DuplicateVersion { version_number, .. } => {
                ApiError::Conflict(format!("Version {} already exists", version_number))
            }
            vellum_core::Error::Conflict(message) => ApiError::Conflict(message),
            other => ApiError::Database(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ExpiredToken => ApiError::Unauthorized("Token has expired".to_string()),
            AuthError::InvalidToken | AuthError::MalformedToken(_) => {
                ApiError::Unauthorized("Invalid authentication token".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// HEALTH HANDLERS
// =============================================================================

/// Greeting for the API root.
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Server is up and running!",
    }))
}

/// Liveness probe reporting database reachability.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    log_pool_metrics(state.db.pool());

    let (status, database) = match state.db.ping().await {
        Ok(()) => ("healthy", "connected"),
        Err(err) => {
            tracing::error!(error = %err, "Database health probe failed");
            ("degraded", "unreachable")
        }
    };

    Json(serde_json::json!({
        "status": status,
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// AUTH HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
}

/// Register a new user account.
///
/// The password is hashed before storage and never leaves the server; the
/// response body is the stored user without the hash.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.users.email_exists(&body.email).await? {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = vellum_auth::hash_password(&body.password)?;

    // The pre-check above races with concurrent registrations; the unique
    // index is the authority, so map its conflict to the same 400.
    let user = match state
        .db
        .users
        .insert(CreateUserRequest {
            username: body.username,
            email: body.email,
            password_hash,
        })
        .await
    {
        Ok(user) => user,
        Err(vellum_core::Error::Conflict(message)) => {
            return Err(ApiError::BadRequest(message));
        }
        Err(err) => return Err(err.into()),
    };

    info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a bearer token.
///
/// Unknown email and wrong password produce the same response, so the
/// endpoint cannot be used to probe which addresses are registered.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users
        .fetch_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !vellum_auth::verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let access_token = state.signer.issue(user.id, state.token_ttl)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

// =============================================================================
// NOTE HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct NoteBody {
    title: String,
    content: String,
}

/// List the authenticated user's notes.
async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state.db.notes.list(auth.user.id).await?;

    Ok(Json(notes))
}

/// Create a note owned by the authenticated user.
async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .db
        .lifecycle
        .create(CreateNoteRequest {
            owner_id: auth.user.id,
            title: body.title,
            content: body.content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// Replace a note's title and content, snapshotting the previous content.
async fn update_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .db
        .lifecycle
        .update(
            id,
            auth.user.id,
            UpdateNoteRequest {
                title: body.title,
                content: body.content,
            },
        )
        .await?;

    Ok(Json(note))
}

/// Delete a note together with its version history.
async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.lifecycle.delete(id, auth.user.id).await?;

    Ok(Json(serde_json::json!({
        "message": "Note deleted successfully",
    })))
}

// =============================================================================
// VERSION HANDLERS
// =============================================================================

/// Rewind a note's content to an older version.
///
/// The current content is snapshotted first, so a restore can itself be
/// undone. The title is left as it is; versions capture content only.
async fn restore_note_version(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, version)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .db
        .lifecycle
        .restore(id, auth.user.id, version)
        .await?;

    Ok(Json(serde_json::json!({
        "message": format!("Note restored to version {}", version),
        "note": note,
    })))
}

/// Fetch a single version of a note.
async fn get_note_version(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, version)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .db
        .lifecycle
        .get_version(id, auth.user.id, version)
        .await?;

    Ok(Json(serde_json::json!({
        "note_id": id,
        "version_number": version,
        "version": record,
    })))
}

/// List a note's versions in ascending order.
async fn list_note_versions(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let versions = state.db.lifecycle.list_versions(id, auth.user.id).await?;

    Ok(Json(serde_json::json!({
        "note_id": id,
        "versions": versions,
    })))
}

// =============================================================================
// ROUTER AND STARTUP
// =============================================================================

fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/note", get(list_notes).post(create_note))
        .route("/note/:id", put(update_note).delete(delete_note))
        .route("/note/:id/restore/:version", post(restore_note_version))
        .route("/note/:id/versions", get(list_note_versions))
        .route("/note/:id/versions/:version", get(get_note_version))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        // 2 MB request body cap; notes are plain text
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "vellum_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vellum_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("vellum-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let app_config = AppConfig::from_env()?;

    info!(
        host = %app_config.host,
        port = app_config.port,
        algorithm = %app_config.algorithm,
        token_ttl_minutes = app_config.access_token_expire_minutes,
        allowed_origins = %app_config.allowed_origins,
        "Configuration loaded"
    );

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&app_config.database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let signer = TokenSigner::new(&app_config.secret_key, app_config.algorithm);
    let state = AppState {
        db,
        signer,
        token_ttl: chrono::Duration::minutes(app_config.access_token_expire_minutes),
    };

    let allowed_origins = parse_allowed_origins(&app_config.allowed_origins);
    let app = build_router(state, allowed_origins);

    // Start server
    let addr: SocketAddr = format!("{}:{}", app_config.host, app_config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

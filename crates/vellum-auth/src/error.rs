//! Error types for authentication operations.

use thiserror::Error;

/// Authentication and credential errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token structure or signature check failed.
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but the expiry is in the past.
    #[error("Token has expired")]
    ExpiredToken,

    /// Token verified and unexpired, but the claims are unusable.
    #[error("Malformed token claims: {0}")]
    MalformedToken(String),

    /// Stored password hash is not a parseable PHC string.
    #[error("Corrupt password hash: {0}")]
    CorruptHash(String),

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hash(String),

    /// HMAC signing failed.
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Unknown signing algorithm name.
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

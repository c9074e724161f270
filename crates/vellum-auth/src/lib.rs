//! # vellum-auth
//!
//! Credential hashing and bearer-token signing for vellum.
//!
//! Two concerns live here, both pure (no database, no I/O beyond the OS
//! random source):
//!
//! - **Password hashing**: Argon2id with per-hash random salts, stored as
//!   PHC-format strings.
//! - **Bearer tokens**: compact HMAC-signed tokens (`HS256`/`HS384`/`HS512`)
//!   carrying a subject ID and an absolute expiry. Tokens are stateless;
//!   there is no revocation list, invalidation is solely by expiry.
//!
//! ## Example
//!
//! ```rust
//! use vellum_auth::{hash_password, verify_password, Algorithm, TokenSigner};
//! use chrono::Duration;
//! use uuid::Uuid;
//!
//! let hash = hash_password("hunter2").unwrap();
//! assert!(verify_password("hunter2", &hash).unwrap());
//!
//! let signer = TokenSigner::new("secret", Algorithm::HS256);
//! let user_id = Uuid::now_v7();
//! let token = signer.issue(user_id, Duration::minutes(30)).unwrap();
//! assert_eq!(signer.validate(&token).unwrap(), user_id);
//! ```

pub mod error;
pub mod password;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use password::{hash_password, verify_password};
pub use token::{Algorithm, TokenSigner, DEFAULT_TOKEN_TTL_MINUTES};

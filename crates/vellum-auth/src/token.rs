//! Signed bearer tokens.
//!
//! Tokens use the compact JWS form (`header.claims.signature`, base64url
//! without padding) with an HMAC-SHA-2 signature. Claims carry the subject
//! user ID (`sub`) and an absolute expiry (`exp`, Unix seconds). Validation
//! checks run in a fixed order: signature first, then expiry, then subject,
//! so each failure class maps to exactly one error.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Token lifetime used when the deployment does not configure one.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// HMAC-SHA-2 signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    HS256,
    HS384,
    HS512,
}

impl Algorithm {
    /// The algorithm's standard JOSE name.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues and validates signed bearer tokens.
///
/// The signer is cheap to clone and safe to share across request tasks; it
/// holds only the secret and the configured algorithm.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    algorithm: Algorithm,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer from a shared secret and algorithm.
    pub fn new(secret: impl AsRef<[u8]>, algorithm: Algorithm) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            algorithm,
        }
    }

    /// Issue a token for a subject, expiring `ttl` from now.
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> AuthResult<String> {
        let header = Header {
            alg: self.algorithm.name().to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: subject.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };

        let header_b64 = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&header).map_err(|e| AuthError::Signing(e.to_string()))?);
        let claims_b64 = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&claims).map_err(|e| AuthError::Signing(e.to_string()))?);

        let signing_input = format!("{}.{}", header_b64, claims_b64);
        let signature = self.sign(signing_input.as_bytes())?;

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Validate a token and return its subject ID.
    ///
    /// Failure classes, checked in order:
    /// - `InvalidToken`: not three dot-separated parts, undecodable parts,
    ///   or a signature that does not verify
    /// - `ExpiredToken`: signature valid but `exp` is in the past
    /// - `MalformedToken`: verified and unexpired, but the claims are not a
    ///   JSON object with a UUID `sub` and integer `exp`
    pub fn validate(&self, token: &str) -> AuthResult<Uuid> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(AuthError::InvalidToken);
        }

        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let signature = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| AuthError::InvalidToken)?;
        self.verify_signature(signing_input.as_bytes(), &signature)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: serde_json::Value = serde_json::from_slice(&claims_bytes)
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

        let exp = claims
            .get("exp")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| AuthError::MalformedToken("missing exp claim".to_string()))?;
        if exp < Utc::now().timestamp() {
            return Err(AuthError::ExpiredToken);
        }

        let sub = claims
            .get("sub")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AuthError::MalformedToken("missing sub claim".to_string()))?;
        Uuid::parse_str(sub)
            .map_err(|_| AuthError::MalformedToken(format!("sub is not a valid UUID: {}", sub)))
    }

    fn sign(&self, data: &[u8]) -> AuthResult<Vec<u8>> {
        let signature = match self.algorithm {
            Algorithm::HS256 => {
                let mut mac = HmacSha256::new_from_slice(&self.secret)
                    .map_err(|e| AuthError::Signing(e.to_string()))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::HS384 => {
                let mut mac = HmacSha384::new_from_slice(&self.secret)
                    .map_err(|e| AuthError::Signing(e.to_string()))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::HS512 => {
                let mut mac = HmacSha512::new_from_slice(&self.secret)
                    .map_err(|e| AuthError::Signing(e.to_string()))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(signature)
    }

    // Constant-time comparison via Mac::verify_slice.
    fn verify_signature(&self, data: &[u8], signature: &[u8]) -> AuthResult<()> {
        match self.algorithm {
            Algorithm::HS256 => {
                let mut mac = HmacSha256::new_from_slice(&self.secret)
                    .map_err(|e| AuthError::Signing(e.to_string()))?;
                mac.update(data);
                mac.verify_slice(signature).map_err(|_| AuthError::InvalidToken)
            }
            Algorithm::HS384 => {
                let mut mac = HmacSha384::new_from_slice(&self.secret)
                    .map_err(|e| AuthError::Signing(e.to_string()))?;
                mac.update(data);
                mac.verify_slice(signature).map_err(|_| AuthError::InvalidToken)
            }
            Algorithm::HS512 => {
                let mut mac = HmacSha512::new_from_slice(&self.secret)
                    .map_err(|e| AuthError::Signing(e.to_string()))?;
                mac.update(data);
                mac.verify_slice(signature).map_err(|_| AuthError::InvalidToken)
            }
        }
    }
}

//! Authentication primitives: password hashing and bearer tokens
//!
//! Tokens are self-contained: `base64url(claims JSON) + "." +
//! hex(SHA-256(encoded claims || shared secret))`. The shared secret is a
//! random non-zero i64 minted into the settings table on first run, so
//! rotating that one row invalidates every outstanding token.
//!
//! Passwords are stored as `hex(SHA-256(salt || password))` next to their
//! per-account random salt.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::fmt;
use thiserror::Error;

/// Settings key holding the token-signing secret
pub const SHARED_SECRET_KEY: &str = "auth_shared_secret";

/// Authentication failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Email unknown, password mismatch, or account disabled
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No `Authorization: Bearer` header on a protected route
    #[error("Missing bearer token")]
    MissingToken,

    /// Token is not two dot-separated parts of valid base64/JSON
    #[error("Malformed bearer token")]
    MalformedToken,

    /// Signature does not match the payload under the current secret
    #[error("Token signature mismatch")]
    BadSignature,

    /// Token expiry is in the past
    #[error("Token expired")]
    Expired,

    /// Authenticated, but the wrong role for this route
    #[error("Requires {required} role")]
    Forbidden { required: Role },

    /// Secret lookup failed
    #[error("Database error: {0}")]
    Database(String),

    /// Claims could not be serialized (should not happen)
    #[error("Internal auth error: {0}")]
    Internal(String),
}

/// Caller role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token claims
///
/// `sub` holds the member guid for member sessions and the admin email for
/// admin sessions. `exp` is Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
}

// ========================================
// Password Hashing
// ========================================

/// Generate a random per-account salt (32 hex chars)
pub fn generate_salt() -> String {
    let salt: u128 = rand::thread_rng().gen();
    format!("{:032x}", salt)
}

/// Hash a password with its salt
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password attempt against the stored hash and salt
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

// ========================================
// Bearer Tokens
// ========================================

/// Sign claims into a bearer token
pub fn mint_token(claims: &Claims, shared_secret: i64) -> Result<String, AuthError> {
    let payload = serde_json::to_vec(claims).map_err(|e| AuthError::Internal(e.to_string()))?;
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    let sig = signature(&encoded, shared_secret);
    Ok(format!("{}.{}", encoded, sig))
}

/// Verify a bearer token and return its claims
///
/// The signature is checked before the payload is decoded, so claims from a
/// token that fails verification are never inspected.
pub fn verify_token(token: &str, shared_secret: i64) -> Result<Claims, AuthError> {
    let (encoded, sig) = token.split_once('.').ok_or(AuthError::MalformedToken)?;

    if signature(encoded, shared_secret) != sig {
        return Err(AuthError::BadSignature);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| AuthError::MalformedToken)?;
    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(AuthError::Expired);
    }

    Ok(claims)
}

/// Hash of the encoded payload concatenated with the secret as decimal
fn signature(encoded_payload: &str, shared_secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded_payload.as_bytes());
    hasher.update(shared_secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

// ========================================
// Shared Secret Management
// ========================================

/// Load the token-signing secret, minting one if absent
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, AuthError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SHARED_SECRET_KEY)
            .fetch_optional(db)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| AuthError::Database(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a fresh random non-zero secret
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, AuthError> {
    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SHARED_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

    Ok(secret)
}

// ========================================
// Tests
// ========================================

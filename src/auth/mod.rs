//! Auth Middleware Module
//!
//! Bearer-token verification with three outcomes per request:
//! - no credential: rejected as unauthenticated (missing-token class, 401)
//! - credential present but verification fails: rejected as forbidden
//!   (invalid-token class, 403)
//! - credential verifies: claims are decoded and flow with the request
//!
//! The verification secret is validated at startup (see `Config::validate`),
//! so a missing secret never masquerades as "all tokens invalid". There is no
//! refresh, rotation, or revocation logic here - single-shot verification only.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoded claims from a verified bearer credential.
///
/// Attached to the request for the handler's lifetime only; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Caller's username (used for claims-sourced dispatch params)
    pub username: String,
    /// Expiration time (seconds since epoch)
    pub exp: usize,
    /// Issued-at time (seconds since epoch)
    #[serde(default)]
    pub iat: usize,
}

/// Authentication failure classes.
///
/// The split matters to clients: missing means "log in", invalid means
/// "token rejected".
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing JWT token")]
    MissingToken,
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Extracts and verifies the bearer credential from an `Authorization`
/// header value.
///
/// # Arguments
///
/// * `header` - Raw `Authorization` header value, if the caller sent one
/// * `secret` - Shared verification secret (validated non-empty at startup)
///
/// # Returns
///
/// - `Ok(Claims)` - Credential verified, decoded claims
/// - `Err(AuthError::MissingToken)` - No credential supplied
/// - `Err(AuthError::InvalidToken)` - Bad signature, expired, or malformed
pub fn authenticate(header: Option<&str>, secret: &str) -> Result<Claims, AuthError> {
    let token = header
        .and_then(|value| value.split(' ').nth(1))
        .ok_or(AuthError::MissingToken)?;

    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(data.claims)
}

//! Unit tests for bearer-token verification
//!
//! These tests verify the three authentication outcomes: missing credential,
//! invalid credential, and verified claims.

use sovereign_gateway::auth::{authenticate, AuthError};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{make_expired_token, make_token, DUMMY_SECRET, DUMMY_USERNAME};

/// What is tested: a request without an Authorization header is rejected
/// Why: no credential must map to the missing-token class, not invalid-token
#[test]
fn test_missing_header_is_missing_token() {
    let result = authenticate(None, DUMMY_SECRET);
    assert!(matches!(result, Err(AuthError::MissingToken)));
}

/// What is tested: a bare scheme with no token value is rejected as missing
/// Why: "Bearer" alone carries no credential to verify
#[test]
fn test_header_without_token_is_missing_token() {
    let result = authenticate(Some("Bearer"), DUMMY_SECRET);
    assert!(matches!(result, Err(AuthError::MissingToken)));
}

/// What is tested: a garbage token is rejected as invalid
/// Why: present-but-unverifiable must be distinguishable from absent
#[test]
fn test_garbage_token_is_invalid() {
    let result = authenticate(Some("Bearer not.a.token"), DUMMY_SECRET);
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

/// What is tested: a token signed with a different secret is rejected
/// Why: signature verification is the entire point of the middleware
#[test]
fn test_wrong_secret_is_invalid() {
    let token = make_token("some-other-secret");
    let header = format!("Bearer {}", token);
    let result = authenticate(Some(&header), DUMMY_SECRET);
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

/// What is tested: an expired token is rejected as invalid
/// Why: expiry enforcement must not be silently skipped
#[test]
fn test_expired_token_is_invalid() {
    let token = make_expired_token(DUMMY_SECRET);
    let header = format!("Bearer {}", token);
    let result = authenticate(Some(&header), DUMMY_SECRET);
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

/// What is tested: a valid token yields the decoded claims
/// Why: handlers downstream rely on the username claim for dispatch params
#[test]
fn test_valid_token_yields_claims() {
    let token = make_token(DUMMY_SECRET);
    let header = format!("Bearer {}", token);

    let claims = authenticate(Some(&header), DUMMY_SECRET).unwrap();
    assert_eq!(claims.username, DUMMY_USERNAME);
    assert!(claims.exp > claims.iat);
}

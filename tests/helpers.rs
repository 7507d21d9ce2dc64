//! Shared test helpers for unit tests
//!
//! This module provides helper functions used by unit tests.
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy identities, keys, and ids used across tests
//! - **Configuration Builders**: Functions to create test configurations
//! - **Registry Builders**: Functions loading the bundled schema documents
//! - **Token Builders**: Functions minting valid and expired bearer tokens

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use sovereign_gateway::api::ApiServer;
use sovereign_gateway::auth::Claims;
use sovereign_gateway::config::{ApiConfig, AuthConfig, Config, SchemaConfig, WorkflowConfig};
use sovereign_gateway::routes::ROOT_SCHEMA;
use sovereign_gateway::schema::{SchemaRegistry, CRITICAL_SCHEMAS};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Shared verification secret used by every test token
pub const DUMMY_SECRET: &str = "test-secret";

/// Dummy caller username carried in test claims
pub const DUMMY_USERNAME: &str = "alice";

/// Dummy public key (20 bytes, 40 hex characters)
#[allow(dead_code)]
pub const DUMMY_PUBLIC_KEY: &str = "0x00112233445566778899aabbccddeeff00112233";

/// Dummy signature (64 bytes, 128 hex characters)
#[allow(dead_code)]
pub const DUMMY_SIGNATURE: &str = "0x00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

/// Dummy UUID used for id-bearing payload fields
#[allow(dead_code)]
pub const DUMMY_UUID: &str = "123e4567-e89b-12d3-a456-426614174000";

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Create a test configuration pointing at the given workflow backend URL.
pub fn build_test_config(workflow_url: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
        },
        auth: AuthConfig {
            jwt_secret: DUMMY_SECRET.to_string(),
        },
        schema: SchemaConfig {
            dir: "schema".to_string(),
        },
        workflow: WorkflowConfig {
            base_url: workflow_url.to_string(),
        },
    }
}

// ============================================================================
// REGISTRY BUILDERS
// ============================================================================

/// Load the bundled schema documents shipped with the crate.
pub fn build_test_registry() -> SchemaRegistry {
    let dir = format!("{}/schema", env!("CARGO_MANIFEST_DIR"));
    SchemaRegistry::load(&dir, CRITICAL_SCHEMAS).expect("bundled schemas should load")
}

/// The bundled root API schema document.
#[allow(dead_code)]
pub fn test_api_schema() -> Value {
    build_test_registry()
        .document(ROOT_SCHEMA)
        .expect("root schema should be bundled")
        .clone()
}

/// Create a test API server backed by the bundled schemas.
#[allow(dead_code)]
pub fn create_test_api_server(workflow_url: &str) -> ApiServer {
    ApiServer::new(build_test_config(workflow_url), build_test_registry())
        .expect("test server should build")
}

// ============================================================================
// TOKEN BUILDERS
// ============================================================================

fn now_secs() -> usize {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock should be past the epoch")
        .as_secs() as usize
}

/// Mint a valid bearer token for the dummy caller.
#[allow(dead_code)]
pub fn make_token(secret: &str) -> String {
    let now = now_secs();
    let claims = Claims {
        username: DUMMY_USERNAME.to_string(),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding should succeed")
}

/// Mint a syntactically valid but expired token (outside default leeway).
#[allow(dead_code)]
pub fn make_expired_token(secret: &str) -> String {
    let now = now_secs();
    let claims = Claims {
        username: DUMMY_USERNAME.to_string(),
        exp: now.saturating_sub(7200),
        iat: now.saturating_sub(10800),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding should succeed")
}

// ============================================================================
// PAYLOAD BUILDERS
// ============================================================================

/// A register request that passes both validation layers.
#[allow(dead_code)]
pub fn valid_register_request() -> Value {
    json!({
        "username": DUMMY_USERNAME,
        "publicKey": DUMMY_PUBLIC_KEY,
    })
}

/// A ritual payload with an intent map and two executable steps.
#[allow(dead_code)]
pub fn ritual_payload() -> Value {
    json!({
        "metadata": { "schema_version": "1.0", "function": "test-ritual" },
        "nlp": {
            "mapIntent": { "greet": "sayHello" },
            "model": "grok_3",
            "language": "en"
        },
        "steps": [
            {
                "id": "op1",
                "type": "blockchain_operation",
                "nl_phrase": "Transfer tokens",
                "params": { "amount": 10 }
            },
            {
                "id": "s2",
                "type": "call",
                "function": "sayHello",
                "nl_phrase": "Hello!",
                "args": {}
            }
        ],
        "rituals": []
    })
}

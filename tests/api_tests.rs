//! Integration tests for the gateway HTTP surface
//!
//! These tests drive the full request pipeline (auth, two-layer validation,
//! dispatch) through warp's test harness, with the workflow backend mocked
//! by wiremock.

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    create_test_api_server, make_token, ritual_payload, valid_register_request, DUMMY_SECRET,
    DUMMY_UUID, DUMMY_USERNAME,
};

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// What is tested: the health endpoint responds without auth or a backend
/// Why: liveness checks must work when everything else is down
#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_api_server("http://127.0.0.1:1");
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["message"], "Sovereign Gateway is running");
}

/// What is tested: a valid register request dispatches and returns 201
/// Why: registration is auth-exempt and carries a creation status
#[tokio::test]
async fn test_register_success() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .and(body_json(json!({
            "workflow": "identity-register",
            "params": valid_register_request(),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "userId": DUMMY_UUID })))
        .expect(1)
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/identity/register")
        .json(&valid_register_request())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["message"], "User registered");
    assert_eq!(body["data"]["userId"], DUMMY_UUID);
}

/// What is tested: a protected endpoint without a credential returns 401
/// Why: the missing-token class must short-circuit before any backend call
#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/governance/vote")
        .json(&json!({ "proposalId": DUMMY_UUID, "vote": "yes" }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 401);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "Missing JWT token");
}

/// What is tested: an unverifiable credential returns 403
/// Why: present-but-invalid is a different class than absent
#[tokio::test]
async fn test_invalid_token_is_forbidden() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/governance/vote")
        .header("authorization", bearer(&make_token("wrong-secret")))
        .json(&json!({ "proposalId": DUMMY_UUID, "vote": "yes" }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 403);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    // The rejection class must be named, not just the raw verification error
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JWT token"));
}

/// What is tested: validation failures return 400 with the aggregated errors
/// Why: the errors envelope is the client's only diagnostic channel
#[tokio::test]
async fn test_validation_failure_returns_errors_envelope() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/identity/register")
        .json(&json!({ "username": DUMMY_USERNAME }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert!(!errors.is_empty());
    assert_eq!(errors[0]["location"], "publicKey");
}

/// What is tested: an unknown module/action pair returns 404
/// Why: paths outside the descriptor table must not fall through anywhere
#[tokio::test]
async fn test_unknown_endpoint_not_found() {
    let server = create_test_api_server("http://127.0.0.1:1");
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/identity/teleport")
        .json(&json!({}))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 404);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "Endpoint not found");
}

/// What is tested: a POST to a GET-only endpoint returns 404
/// Why: the descriptor table is keyed by method; mismatches never dispatch
#[tokio::test]
async fn test_wrong_method_not_found() {
    let server = create_test_api_server("http://127.0.0.1:1");
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/identity/reputation")
        .header("authorization", bearer(&make_token(DUMMY_SECRET)))
        .json(&json!({}))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 404);
}

/// What is tested: a syntactically invalid body returns 400
/// Why: malformed JSON is a bad request, not a validation failure or a 500
#[tokio::test]
async fn test_invalid_json_bad_request() {
    let server = create_test_api_server("http://127.0.0.1:1");
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/identity/register")
        .header("content-type", "application/json")
        .body("{ not json")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON"));
}

/// What is tested: the reputation endpoint dispatches the caller's identity
/// Why: claims-sourced params must come from the token, never the request
#[tokio::test]
async fn test_reputation_dispatches_claims_identity() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .and(body_json(json!({
            "workflow": "identity-reputation",
            "params": { "username": DUMMY_USERNAME },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "karma": 42 })))
        .expect(1)
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("GET")
        .path("/identity/reputation?username=mallory")
        .header("authorization", bearer(&make_token(DUMMY_SECRET)))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["message"], "Reputation retrieved");
    assert_eq!(body["data"]["karma"], 42);
}

/// What is tested: an authenticated vote flows through to the backend
/// Why: the full happy path for a protected mutating endpoint
#[tokio::test]
async fn test_authenticated_vote_dispatches() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .and(body_json(json!({
            "workflow": "governance-vote",
            "params": { "proposalId": DUMMY_UUID, "vote": "yes" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "recorded": true })))
        .expect(1)
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/governance/vote")
        .header("authorization", bearer(&make_token(DUMMY_SECRET)))
        .json(&json!({ "proposalId": DUMMY_UUID, "vote": "yes" }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["message"], "Vote cast");
    assert_eq!(body["data"]["recorded"], true);
}

/// What is tested: a backend failure surfaces as 500 with the backend's message
/// Why: dispatch failures must be reported, not swallowed into a success
#[tokio::test]
async fn test_backend_error_propagates() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/identity/register")
        .json(&valid_register_request())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 500);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "boom");
}

/// What is tested: the ritual interpreter route executes steps in-process
/// Why: ritual execution never touches the workflow backend
#[tokio::test]
async fn test_ritual_execute_success() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&backend)
        .await;

    let server = create_test_api_server(&backend.uri());
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/ritual/execute")
        .header("authorization", bearer(&make_token(DUMMY_SECRET)))
        .json(&ritual_payload())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["message"], "Ritual executed");
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["intents"][0]["nl_phrase"], "Hello!");
}

/// What is tested: the ritual route demands a credential
/// Why: there is no auth exemption for the interpreter
#[tokio::test]
async fn test_ritual_execute_requires_auth() {
    let server = create_test_api_server("http://127.0.0.1:1");
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/ritual/execute")
        .json(&ritual_payload())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 401);
}

/// What is tested: a ritual with no steps returns 400 with the guard message
/// Why: interpreter failures map to the single-error envelope
#[tokio::test]
async fn test_ritual_execute_no_steps() {
    let server = create_test_api_server("http://127.0.0.1:1");
    let routes = server.test_routes();

    let response = warp::test::request()
        .method("POST")
        .path("/ritual/execute")
        .header("authorization", bearer(&make_token(DUMMY_SECRET)))
        .json(&json!({
            "metadata": { "schema_version": "1.0" },
            "steps": [],
            "rituals": []
        }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "No steps provided");
}

//! Generic API structures and handlers
//!
//! This module contains the response envelopes, rejection types, filter
//! helpers, and the generic dispatch handlers for the gateway. Endpoints are
//! served from the in-memory descriptor table; every request flows through
//! the same fail-fast chain of authentication, field-contract validation,
//! and document-schema validation before dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use warp::hyper::body::Bytes;
use warp::{
    http::{Method as HttpMethod, StatusCode},
    Filter, Rejection,
};

use crate::auth::{self, AuthError, Claims};
use crate::config::Config;
use crate::dispatch::WorkflowClient;
use crate::ritual::{self, RitualError};
use crate::routes::{self, EndpointDescriptor, Method};
use crate::schema::{DocumentValidator, SchemaRegistry};
use crate::validate::{self, ContractTable, ValidationError};

// ============================================================================
// RESPONSE ENVELOPES
// ============================================================================

/// Success envelope: `{message, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub message: String,
    pub data: Value,
}

/// Failure envelope for single errors: `{error}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Failure envelope for aggregated validation errors: `{errors: [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorsEnvelope {
    pub errors: Vec<ValidationError>,
}

// ============================================================================
// REJECTION TYPES
// ============================================================================

/// Gateway error taxonomy, mapped centrally in [`handle_rejection`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No credential supplied (401)
    #[error("Missing JWT token")]
    MissingToken,
    /// Credential present but verification failed (403)
    #[error("{0}")]
    InvalidToken(String),
    /// Aggregated validation failures (400, `{errors}` envelope)
    #[error("Validation failed")]
    Validation(Vec<ValidationError>),
    /// Malformed request outside the validation layers (400)
    #[error("{0}")]
    BadRequest(String),
    /// No descriptor matches the requested method and path (404)
    #[error("Endpoint not found")]
    UnknownEndpoint,
    /// Workflow backend or step execution failure (500, message only)
    #[error("{0}")]
    Execution(String),
}

impl warp::reject::Reject for GatewayError {}

fn reject(error: GatewayError) -> Rejection {
    warp::reject::custom(error)
}

// ============================================================================
// GATEWAY STATE
// ============================================================================

/// One live endpoint: its descriptor plus the document validator compiled for
/// its schema node.
struct EndpointRuntime {
    descriptor: EndpointDescriptor,
    validator: DocumentValidator,
}

/// Read-only state shared across requests.
///
/// Populated once at startup; request handlers never mutate it. All
/// per-request state (claims, payloads, ritual context) is passed as
/// parameters instead.
struct GatewayState {
    config: Config,
    endpoints: HashMap<(Method, String, String), Arc<EndpointRuntime>>,
    contracts: ContractTable,
    workflow: WorkflowClient,
    ritual_validator: DocumentValidator,
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// HTTP server for the gateway.
///
/// Compiles the endpoint table from the root API schema at construction time
/// and serves it with the uniform request pipeline.
pub struct ApiServer {
    state: Arc<GatewayState>,
}

impl ApiServer {
    /// Creates a new API server from configuration and a loaded registry.
    ///
    /// This compiles the endpoint descriptor table, the per-endpoint document
    /// validators, and the field-contract table. Failures here are
    /// configuration errors and abort startup.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration (already validated)
    /// * `registry` - Schema registry (critical schemas already enforced)
    pub fn new(config: Config, registry: SchemaRegistry) -> Result<Self> {
        let api_schema = registry
            .document(routes::ROOT_SCHEMA)
            .ok_or_else(|| anyhow::anyhow!("Root schema '{}' not found", routes::ROOT_SCHEMA))?;

        let descriptors = routes::compile(api_schema)?;
        info!("Compiled {} endpoints from root schema", descriptors.len());

        let mut endpoints = HashMap::new();
        for descriptor in descriptors {
            let validator = registry.validator_for(
                &descriptor.schema_doc,
                Some(&descriptor.module),
                Some(&descriptor.action),
            );
            if !validator.is_compiled() {
                warn!(
                    "No compiled validator for {} - document validation will be skipped",
                    descriptor.workflow
                );
            }
            endpoints.insert(
                (
                    descriptor.method,
                    descriptor.module.clone(),
                    descriptor.action.clone(),
                ),
                Arc::new(EndpointRuntime { descriptor, validator }),
            );
        }

        let ritual_validator = registry.validator_for("ritual", None, None);
        let contracts = ContractTable::new()?;
        let workflow = WorkflowClient::new(&config.workflow.base_url);

        Ok(Self {
            state: Arc::new(GatewayState {
                config,
                endpoints,
                contracts,
                workflow,
                ritual_validator,
            }),
        })
    }

    /// Starts the API server and begins handling HTTP requests.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Server ran to shutdown
    /// * `Err(anyhow::Error)` - Failed to bind the configured address
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting API server on {}:{}",
            self.state.config.api.host, self.state.config.api.port
        );

        let routes = self.create_routes();

        let addr: std::net::SocketAddr = format!(
            "{}:{}",
            self.state.config.api.host, self.state.config.api.port
        )
        .parse()
        .context("Failed to parse API server address")?;

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Creates all API routes for the server.
    ///
    /// Route order matters: the health check and the ritual interpreter route
    /// are matched before the generic descriptor table.
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        // Health check endpoint - returns service status
        let health = warp::path("health").and(warp::get()).map(|| {
            warp::reply::json(&SuccessEnvelope {
                message: "Sovereign Gateway is running".to_string(),
                data: Value::Null,
            })
        });

        // Ritual interpreter endpoint - validates the nested ritual payload
        // and executes its step list
        let ritual_state = self.state.clone();
        let ritual_execute = warp::path!("ritual" / "execute")
            .and(warp::post())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::bytes())
            .and_then(move |auth_header: Option<String>, body: Bytes| {
                let state = ritual_state.clone();
                async move { ritual_execute_handler(state, auth_header, body).await }
            });

        // Generic mutating endpoints from the descriptor table
        let post_state = self.state.clone();
        let post_routes = warp::path::param::<String>()
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::bytes())
            .and_then(
                move |module: String, action: String, auth_header: Option<String>, body: Bytes| {
                    let state = post_state.clone();
                    async move {
                        dispatch_handler(state, Method::Post, module, action, auth_header, body)
                            .await
                    }
                },
            );

        // Less common mutating methods share the dispatch pipeline
        let put_state = self.state.clone();
        let put_routes = warp::path::param::<String>()
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::put())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::bytes())
            .and_then(
                move |module: String, action: String, auth_header: Option<String>, body: Bytes| {
                    let state = put_state.clone();
                    async move {
                        dispatch_handler(state, Method::Put, module, action, auth_header, body)
                            .await
                    }
                },
            );

        let delete_state = self.state.clone();
        let delete_routes = warp::path::param::<String>()
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::delete())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::bytes())
            .and_then(
                move |module: String, action: String, auth_header: Option<String>, body: Bytes| {
                    let state = delete_state.clone();
                    async move {
                        dispatch_handler(state, Method::Delete, module, action, auth_header, body)
                            .await
                    }
                },
            );

        // Generic read endpoints from the descriptor table (params from query)
        let get_state = self.state.clone();
        let get_routes = warp::path::param::<String>()
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::header::optional::<String>("authorization"))
            .and(
                warp::query::raw()
                    .or(warp::any().map(String::new))
                    .unify(),
            )
            .and_then(
                move |module: String, action: String, auth_header: Option<String>, query: String| {
                    let state = get_state.clone();
                    async move { query_handler(state, module, action, auth_header, query).await }
                },
            );

        // Combine all routes and apply rejection handler
        health
            .or(ritual_execute)
            .or(get_routes)
            .or(post_routes)
            .or(put_routes)
            .or(delete_routes)
            .with(create_cors_filter(&self.state.config.api.cors_origins))
            .recover(handle_rejection)
    }

    /// Public method for testing - exposes routes for integration tests
    #[allow(dead_code)] // Used by tests
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}

// ============================================================================
// REQUEST HANDLERS
// ============================================================================

/// Handler for mutating endpoints: auth, two-layer validation, dispatch.
async fn dispatch_handler(
    state: Arc<GatewayState>,
    method: Method,
    module: String,
    action: String,
    auth_header: Option<String>,
    body: Bytes,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Rejection> {
    let endpoint = lookup(&state, method, &module, &action)?;

    let claims = authorize(&state, &endpoint.descriptor, auth_header.as_deref())?;

    let body_str = String::from_utf8_lossy(&body);
    debug!("{} /{}/{} - Received body: {}", method, module, action, body_str);
    let payload = parse_body(&body)?;

    // Layer 1 (field contracts) then layer 2 (document schema); either
    // failing aborts before dispatch
    let errors = validate::validate_request(
        &state.contracts,
        &endpoint.descriptor.workflow,
        &endpoint.validator,
        &payload,
    );
    if !errors.is_empty() {
        warn!(
            "Validation failed for {}: {} error(s)",
            endpoint.descriptor.workflow,
            errors.len()
        );
        return Err(reject(GatewayError::Validation(errors)));
    }

    let params = dispatch_params(&endpoint.descriptor, claims.as_ref(), payload);
    execute(&state, &endpoint.descriptor, params).await
}

/// Handler for read endpoints: auth, then dispatch with query params.
///
/// Read actions carry no body; neither field contracts nor document schemas
/// apply to them.
async fn query_handler(
    state: Arc<GatewayState>,
    module: String,
    action: String,
    auth_header: Option<String>,
    query: String,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Rejection> {
    let endpoint = lookup(&state, Method::Get, &module, &action)?;

    let claims = authorize(&state, &endpoint.descriptor, auth_header.as_deref())?;

    let payload = parse_query(&query)?;
    let params = dispatch_params(&endpoint.descriptor, claims.as_ref(), payload);
    execute(&state, &endpoint.descriptor, params).await
}

/// Handler for `POST /ritual/execute`: the ritual step interpreter pipeline.
async fn ritual_execute_handler(
    state: Arc<GatewayState>,
    auth_header: Option<String>,
    body: Bytes,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Rejection> {
    // Ritual execution always requires a credential
    match auth::authenticate(auth_header.as_deref(), &state.config.auth.jwt_secret) {
        Ok(_claims) => {}
        Err(AuthError::MissingToken) => return Err(reject(GatewayError::MissingToken)),
        Err(e @ AuthError::InvalidToken(_)) => {
            return Err(reject(GatewayError::InvalidToken(e.to_string())))
        }
    }

    let payload = parse_body(&body)?;

    let outcome = ritual::interpret(&payload, &state.ritual_validator).map_err(|e| match e {
        RitualError::Validation(errors) => reject(GatewayError::Validation(errors)),
        RitualError::RitualsNotArray | RitualError::NoSteps => {
            reject(GatewayError::BadRequest(e.to_string()))
        }
        RitualError::Malformed(message) => reject(GatewayError::BadRequest(message)),
        RitualError::Execution(message) => reject(GatewayError::Execution(message)),
    })?;

    let data = serde_json::to_value(&outcome)
        .map_err(|e| reject(GatewayError::Execution(e.to_string())))?;

    Ok(warp::reply::with_status(
        warp::reply::json(&SuccessEnvelope {
            message: "Ritual executed".to_string(),
            data,
        }),
        StatusCode::OK,
    ))
}

// ============================================================================
// PIPELINE STAGES
// ============================================================================

/// Looks up the endpoint descriptor for a method and path pair.
fn lookup(
    state: &GatewayState,
    method: Method,
    module: &str,
    action: &str,
) -> Result<Arc<EndpointRuntime>, Rejection> {
    state
        .endpoints
        .get(&(method, module.to_string(), action.to_string()))
        .cloned()
        .ok_or_else(|| reject(GatewayError::UnknownEndpoint))
}

/// Verifies the caller's credential when the endpoint requires one.
///
/// Runs before any validation or dispatch; a rejected credential never
/// reaches a handler-level side effect.
fn authorize(
    state: &GatewayState,
    descriptor: &EndpointDescriptor,
    header: Option<&str>,
) -> Result<Option<Claims>, Rejection> {
    if !descriptor.requires_auth {
        return Ok(None);
    }
    match auth::authenticate(header, &state.config.auth.jwt_secret) {
        Ok(claims) => Ok(Some(claims)),
        Err(AuthError::MissingToken) => Err(reject(GatewayError::MissingToken)),
        Err(e @ AuthError::InvalidToken(_)) => {
            Err(reject(GatewayError::InvalidToken(e.to_string())))
        }
    }
}

/// Parses a request body into a JSON payload. An empty body is an empty
/// object, matching the behavior of JSON body middleware.
fn parse_body(body: &Bytes) -> Result<Value, Rejection> {
    if body.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| {
        error!("Body deserialization failed: {}", e);
        reject(GatewayError::BadRequest(format!("Invalid JSON: {}", e)))
    })
}

/// Parses a raw query string into a JSON object of string values.
fn parse_query(query: &str) -> Result<Value, Rejection> {
    let parsed = url::Url::parse(&format!("http://dummy?{}", query))
        .map_err(|e| reject(GatewayError::BadRequest(format!("Invalid query string: {}", e))))?;

    let mut params = serde_json::Map::new();
    for (key, value) in parsed.query_pairs() {
        params.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    Ok(Value::Object(params))
}

/// Builds the dispatch params for an endpoint.
///
/// Claims-sourced endpoints take their params from the verified identity
/// rather than the request (the caller asks about themselves).
fn dispatch_params(
    descriptor: &EndpointDescriptor,
    claims: Option<&Claims>,
    payload: Value,
) -> Value {
    let claims_sourced = routes::CLAIMS_PARAM
        .contains(&(descriptor.module.as_str(), descriptor.action.as_str()));
    match (claims_sourced, claims) {
        (true, Some(claims)) => serde_json::json!({ "username": claims.username }),
        _ => payload,
    }
}

/// Dispatches to the workflow backend and wraps the result.
async fn execute(
    state: &GatewayState,
    descriptor: &EndpointDescriptor,
    params: Value,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Rejection> {
    let result = state
        .workflow
        .execute(&descriptor.workflow, params)
        .await
        .map_err(|e| reject(GatewayError::Execution(e.to_string())))?;

    let status = StatusCode::from_u16(descriptor.success_status).unwrap_or(StatusCode::OK);
    Ok(warp::reply::with_status(
        warp::reply::json(&SuccessEnvelope {
            message: descriptor.message.clone(),
            data: result,
        }),
        status,
    ))
}

// ============================================================================
// CORS CONFIGURATION
// ============================================================================

/// Creates a CORS filter based on the configured allowed origins.
fn create_cors_filter(allowed_origins: &[String]) -> warp::cors::Builder {
    let methods = vec![
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
        HttpMethod::OPTIONS,
    ];

    if allowed_origins.contains(&"*".to_string()) {
        warp::cors()
            .allow_any_origin()
            .allow_methods(methods.clone())
            .allow_headers(vec!["content-type", "authorization"])
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(|s| s.as_str()).collect();
        warp::cors()
            .allow_origins(origins)
            .allow_methods(methods)
            .allow_headers(vec!["content-type", "authorization"])
    }
}

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Global rejection handler for all API routes.
///
/// Converts every rejection into the uniform JSON envelope with the
/// appropriate status code; callers never see a raw stack trace.
pub async fn handle_rejection(
    rej: Rejection,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, std::convert::Infallible> {
    if let Some(err) = rej.find::<GatewayError>() {
        let (status, reply) = match err {
            GatewayError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                warp::reply::json(&ErrorsEnvelope {
                    errors: errors.clone(),
                }),
            ),
            GatewayError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                warp::reply::json(&ErrorEnvelope {
                    error: err.to_string(),
                }),
            ),
            GatewayError::InvalidToken(_) => (
                StatusCode::FORBIDDEN,
                warp::reply::json(&ErrorEnvelope {
                    error: err.to_string(),
                }),
            ),
            GatewayError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                warp::reply::json(&ErrorEnvelope {
                    error: err.to_string(),
                }),
            ),
            GatewayError::UnknownEndpoint => (
                StatusCode::NOT_FOUND,
                warp::reply::json(&ErrorEnvelope {
                    error: err.to_string(),
                }),
            ),
            GatewayError::Execution(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                warp::reply::json(&ErrorEnvelope {
                    error: err.to_string(),
                }),
            ),
        };
        return Ok(warp::reply::with_status(reply, status));
    }

    let (status, message) = if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else if let Some(err) = rej.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", err))
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorEnvelope { error: message }),
        status,
    ))
}

//! Sovereign Gateway Library
//!
//! This crate provides a schema-driven HTTP API gateway. A declarative tree of
//! module/action schemas is compiled into live endpoints; inbound requests pass
//! through bearer-token authentication, field-contract validation, and
//! document-schema validation before being dispatched to an external workflow
//! backend. The gateway holds no business logic of its own.

pub mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod ritual;
pub mod routes;
pub mod schema;
pub mod validate;

// Re-export commonly used types
pub use api::ApiServer;
pub use auth::Claims;
pub use config::{ApiConfig, AuthConfig, Config, SchemaConfig, WorkflowConfig};
pub use dispatch::WorkflowClient;
pub use ritual::{IntentMapping, RitualOutcome, Step, StepResult};
pub use routes::{compile, emit, EndpointDescriptor, Method};
pub use schema::{DocumentValidator, SchemaRegistry};
pub use validate::{ContractTable, ValidationError};

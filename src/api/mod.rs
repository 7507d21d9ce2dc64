//! REST API Server Module
//!
//! This module provides the HTTP surface of the gateway: the compiled
//! endpoint table served through a dynamic `/module/action` route, the
//! ritual interpreter route, and the centralized rejection handler that
//! guarantees every request terminates with a JSON envelope.
//!
//! ## Request pipeline
//!
//! Auth middleware -> field contracts -> document schema -> dispatch (or
//! ritual interpretation) -> response envelope. Validation and auth errors
//! are handled at the pipeline boundary and never reach the dispatch layer.

// Generic shared code (envelopes, filters, handlers, rejection mapping)
mod generic;

// Re-export ApiServer for convenience
pub use generic::ApiServer;
// Re-export envelopes for testing
#[allow(unused_imports)]
pub use generic::{ErrorEnvelope, ErrorsEnvelope, GatewayError, SuccessEnvelope};

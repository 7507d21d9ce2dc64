//! Route Compiler Module
//!
//! This module walks the root API schema's module/action tree and emits one
//! endpoint descriptor per action leaf. The descriptor table is the primary
//! routing mode: the HTTP layer matches incoming `/module/action` requests
//! against it directly. A code-generation step ([`emit`]) renders the same
//! table as a Rust source module for inspection or embedding; regenerating
//! from an unchanged schema produces byte-identical output.
//!
//! Naming convention: path `/module/action`, workflow id `module-action`.
//! The workflow id is the contract key shared with the workflow backend.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the root API schema document in the registry.
pub const ROOT_SCHEMA: &str = "sovereign-api";

/// Endpoints served without a bearer credential.
///
/// Registration and authentication are the only actions a caller can reach
/// before holding a token; everything else requires one.
pub const AUTH_EXEMPT: &[(&str, &str)] = &[
    ("identity", "register"),
    ("identity", "authenticate"),
];

/// Endpoints whose dispatch params come from the verified claims instead of
/// the query string.
pub const CLAIMS_PARAM: &[(&str, &str)] = &[("identity", "reputation")];

// ============================================================================
// ENDPOINT DESCRIPTOR
// ============================================================================

/// HTTP method for a compiled endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parses a schema-leaf method string (case-insensitive).
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(anyhow::anyhow!("Unsupported method '{}' in schema leaf", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

/// One live endpoint derived from a schema leaf.
///
/// Derived deterministically and uniquely from one `(module, action)` pair;
/// no two leaves can collide on `(method, path)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Request path: `/module/action`
    pub path: String,
    /// HTTP method (schema leaf `method` key, default POST)
    pub method: Method,
    /// Workflow identifier: `module-action`
    pub workflow: String,
    /// Human description of the endpoint
    pub description: String,
    /// Module segment
    pub module: String,
    /// Action segment
    pub action: String,
    /// Schema document used for payload validation
    pub schema_doc: String,
    /// Status code on success (schema leaf `successStatus` key, default 200;
    /// creation actions declare 201)
    pub success_status: u16,
    /// Success envelope message (schema leaf `title` key when present)
    pub message: String,
    /// Whether a bearer credential is required
    pub requires_auth: bool,
}

// ============================================================================
// COMPILER
// ============================================================================

/// Compiles the endpoint descriptor table from the root API schema.
///
/// For every `(module, action)` pair found at depth two of the schema's
/// `properties` map, produces one descriptor. Iteration order over
/// `serde_json::Map` is lexicographic, so the output ordering is stable
/// across runs.
///
/// # Arguments
///
/// * `api_schema` - The parsed root API schema document
///
/// # Returns
///
/// - `Ok(Vec<EndpointDescriptor>)` - One descriptor per action leaf
/// - `Err(anyhow::Error)` - A leaf carries an unsupported `method` value
pub fn compile(api_schema: &Value) -> Result<Vec<EndpointDescriptor>> {
    let mut endpoints = Vec::new();

    let modules = match api_schema.get("properties").and_then(Value::as_object) {
        Some(modules) => modules,
        None => return Ok(endpoints),
    };

    for (module, module_schema) in modules {
        let actions = match module_schema.get("properties").and_then(Value::as_object) {
            Some(actions) => actions,
            None => continue,
        };

        for (action, leaf) in actions {
            let method = match leaf.get("method").and_then(Value::as_str) {
                Some(value) => Method::parse(value)?,
                None => Method::Post,
            };
            let success_status = leaf
                .get("successStatus")
                .and_then(Value::as_u64)
                .unwrap_or(200) as u16;
            let message = leaf
                .get("title")
                .and_then(Value::as_str)
                .map(|title| title.to_string())
                .unwrap_or_else(|| format!("{} completed", action));

            endpoints.push(EndpointDescriptor {
                path: format!("/{}/{}", module, action),
                method,
                workflow: format!("{}-{}", module, action),
                description: format!("{} action for {} module", action, module),
                module: module.clone(),
                action: action.clone(),
                schema_doc: document_for(module).to_string(),
                success_status,
                message,
                requires_auth: !AUTH_EXEMPT.contains(&(module.as_str(), action.as_str())),
            });
        }
    }

    endpoints.sort_by(|a, b| a.path.cmp(&b.path).then(a.method.to_string().cmp(&b.method.to_string())));
    Ok(endpoints)
}

/// Maps a module name to the schema document validating its payloads.
///
/// Identity payloads live in the `agent` document; every other module has a
/// document of its own name.
pub fn document_for(module: &str) -> &str {
    match module {
        "identity" => "agent",
        other => other,
    }
}

// ============================================================================
// CODE GENERATION
// ============================================================================

/// Renders the descriptor table as a Rust source module.
///
/// This is a pure function of the descriptor list: compiling an unchanged
/// schema and emitting twice produces byte-identical output.
pub fn emit(endpoints: &[EndpointDescriptor]) -> String {
    let mut out = String::new();
    out.push_str("//! Generated routing module. Do not edit by hand.\n");
    out.push_str("//!\n");
    out.push_str("//! Regenerate with `sovereign-gateway --emit-routes <path>` whenever the\n");
    out.push_str("//! root API schema changes.\n\n");
    out.push_str("use crate::routes::{EndpointDescriptor, Method};\n\n");
    out.push_str("/// Endpoint descriptor table compiled from the root API schema.\n");
    out.push_str("pub fn endpoints() -> Vec<EndpointDescriptor> {\n");
    out.push_str("    vec![\n");

    for endpoint in endpoints {
        out.push_str("        EndpointDescriptor {\n");
        out.push_str(&format!("            path: {:?}.to_string(),\n", endpoint.path));
        out.push_str(&format!("            method: Method::{:?},\n", endpoint.method));
        out.push_str(&format!("            workflow: {:?}.to_string(),\n", endpoint.workflow));
        out.push_str(&format!(
            "            description: {:?}.to_string(),\n",
            endpoint.description
        ));
        out.push_str(&format!("            module: {:?}.to_string(),\n", endpoint.module));
        out.push_str(&format!("            action: {:?}.to_string(),\n", endpoint.action));
        out.push_str(&format!(
            "            schema_doc: {:?}.to_string(),\n",
            endpoint.schema_doc
        ));
        out.push_str(&format!(
            "            success_status: {},\n",
            endpoint.success_status
        ));
        out.push_str(&format!("            message: {:?}.to_string(),\n", endpoint.message));
        out.push_str(&format!(
            "            requires_auth: {},\n",
            endpoint.requires_auth
        ));
        out.push_str("        },\n");
    }

    out.push_str("    ]\n");
    out.push_str("}\n");
    out
}

/// Writes the generated routing module to disk.
///
/// A write failure here is a startup-class error: the caller is expected to
/// report it and exit non-zero.
pub fn write_generated(endpoints: &[EndpointDescriptor], path: &str) -> Result<()> {
    let rendered = emit(endpoints);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Error writing routes: {}", e))?;
        }
    }
    std::fs::write(path, rendered).map_err(|e| anyhow::anyhow!("Error writing routes: {}", e))?;
    Ok(())
}

//! Schema Registry Module
//!
//! This module loads and indexes JSON schema documents by name, compiles
//! validators for them, and enforces that the designated critical subset
//! loads successfully before the gateway serves traffic.
//!
//! The registry is populated once at startup and is immutable afterwards;
//! request handlers only ever read from it.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::{info, warn};

use crate::validate::ValidationError;

/// Schema names that must load and compile or the process refuses to start.
///
/// A gateway with a missing or broken critical schema would silently skip
/// validation for whole modules, so startup aborts instead.
pub const CRITICAL_SCHEMAS: &[&str] = &[
    "sovereign-api",
    "agent",
    "ritual",
    "governance",
    "oracle",
    "casino",
    "market",
    "feed",
];

// ============================================================================
// DOCUMENT VALIDATOR
// ============================================================================

/// A compiled validator for one schema node, or an explicit skip marker.
///
/// The skip variant exists so that "unknown schema" is a logged, observable
/// outcome rather than a silent always-true branch: operators can detect when
/// validation coverage is accidentally absent.
#[derive(Clone)]
pub enum DocumentValidator {
    /// Compiled schema node; validation runs against the full payload
    Compiled(Arc<JSONSchema>),
    /// The named schema is not registered; validation is skipped (and logged)
    SkipUnknown(String),
}

impl DocumentValidator {
    /// Validates a payload, returning the aggregated error set.
    ///
    /// An empty vector means the payload passed (or the schema was unknown,
    /// which is logged per call).
    pub fn validate(&self, payload: &Value) -> Vec<ValidationError> {
        match self {
            DocumentValidator::Compiled(compiled) => match compiled.validate(payload) {
                Ok(()) => Vec::new(),
                Err(errors) => errors
                    .map(|err| ValidationError {
                        location: err.instance_path.to_string(),
                        message: err.to_string(),
                        params: serde_json::json!({
                            "schemaPath": err.schema_path.to_string(),
                        }),
                    })
                    .collect(),
            },
            DocumentValidator::SkipUnknown(name) => {
                warn!("Unknown schema '{}' - validation skipped", name);
                Vec::new()
            }
        }
    }

    /// Returns true when this validator will actually check payloads.
    pub fn is_compiled(&self) -> bool {
        matches!(self, DocumentValidator::Compiled(_))
    }
}

// ============================================================================
// SCHEMA REGISTRY
// ============================================================================

/// Registry of schema documents indexed by derived name.
///
/// Names are derived from file stems: `agent.schema.json` registers as
/// `agent`. Documents are raw JSON values; validators are compiled on demand
/// via [`SchemaRegistry::validator_for`] (endpoint setup compiles each one
/// exactly once and shares it behind an `Arc`).
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Value>,
}

impl SchemaRegistry {
    /// Loads all schema documents under a root directory.
    ///
    /// Every `*.schema.json` file below `dir` is parsed and indexed. For
    /// names in `critical`, a parse or compile failure is fatal; other
    /// failures are logged and the document is skipped. After discovery,
    /// every critical name must be present.
    ///
    /// # Arguments
    ///
    /// * `dir` - Root directory of the schema tree
    /// * `critical` - Schema names that must load successfully
    ///
    /// # Returns
    ///
    /// - `Ok(SchemaRegistry)` - All critical schemas registered
    /// - `Err(anyhow::Error)` - A critical schema is missing or broken
    pub fn load(dir: &str, critical: &[&str]) -> Result<Self> {
        let pattern = format!("{}/**/*.schema.json", dir.trim_end_matches('/'));
        let mut documents = HashMap::new();

        let paths = glob::glob(&pattern)
            .with_context(|| format!("Invalid schema glob pattern: {}", pattern))?;

        for entry in paths {
            let path = entry.context("Failed to read schema directory entry")?;
            let name = match schema_name(&path) {
                Some(name) => name,
                None => continue,
            };
            let is_critical = critical.contains(&name.as_str());

            match read_document(&path) {
                Ok(document) => {
                    documents.insert(name, document);
                }
                Err(e) if is_critical => {
                    return Err(e.context(format!(
                        "Critical schema load error: {}",
                        path.display()
                    )));
                }
                Err(e) => {
                    warn!("Schema load error: {} ({})", path.display(), e);
                }
            }
        }

        Self::from_documents(documents, critical)
    }

    /// Builds a registry from already-parsed documents.
    ///
    /// Enforces the critical subset: every critical name must be present and
    /// its whole-document validator must compile.
    pub fn from_documents(
        documents: HashMap<String, Value>,
        critical: &[&str],
    ) -> Result<Self> {
        for name in critical {
            let document = documents.get(*name).ok_or_else(|| {
                anyhow::anyhow!("Critical schema '{}' not found in schema directory", name)
            })?;
            JSONSchema::compile(document)
                .map_err(|e| anyhow::anyhow!("Critical schema '{}' failed to compile: {}", name, e))?;
            info!("Loaded critical schema: {}", name);
        }

        Ok(Self { schemas: documents })
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true when no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns the raw document registered under `name`.
    pub fn document(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Returns a validator for the most specific schema node found by
    /// descending `name -> module -> action`.
    ///
    /// Fallback chain:
    /// 1. The nested `properties.{module}.properties.{action}` node, if present
    /// 2. The whole document, if the nested node is absent or fails to compile
    /// 3. An explicit skip validator when `name` itself is not registered
    ///    (permissive-by-default for unknown schemas, logged on every use)
    pub fn validator_for(
        &self,
        name: &str,
        module: Option<&str>,
        action: Option<&str>,
    ) -> DocumentValidator {
        let document = match self.schemas.get(name) {
            Some(document) => document,
            None => {
                warn!("Schema '{}' not found", name);
                return DocumentValidator::SkipUnknown(name.to_string());
            }
        };

        if let (Some(module), Some(action)) = (module, action) {
            let node = document
                .get("properties")
                .and_then(|properties| properties.get(module))
                .and_then(|module_schema| module_schema.get("properties"))
                .and_then(|properties| properties.get(action));

            if let Some(node) = node {
                match JSONSchema::compile(node) {
                    Ok(compiled) => return DocumentValidator::Compiled(Arc::new(compiled)),
                    Err(e) => {
                        warn!(
                            "Schema node {}.{}.{} failed to compile ({}), falling back to whole document",
                            name, module, action, e
                        );
                    }
                }
            }
        }

        match JSONSchema::compile(document) {
            Ok(compiled) => DocumentValidator::Compiled(Arc::new(compiled)),
            Err(e) => {
                warn!("Schema '{}' failed to compile ({}), validation skipped", name, e);
                DocumentValidator::SkipUnknown(name.to_string())
            }
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Derives a registry name from a schema file path.
///
/// `schema/agent.schema.json` registers as `agent`; files without the
/// `.schema.json` suffix are ignored.
fn schema_name(path: &std::path::Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name
        .strip_suffix(".schema.json")
        .map(|stem| stem.to_string())
}

/// Reads and parses one schema document.
fn read_document(path: &std::path::Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(document)
}

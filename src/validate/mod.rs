//! Validation Pipeline Module
//!
//! Two independent validation layers compose here:
//! 1. Field contracts - per-field rules (presence, type, format, range,
//!    enumerations, patterns) declared per endpoint, all checked, all
//!    failures collected.
//! 2. Document schema - the module/action-scoped validator from the schema
//!    registry runs against the full payload.
//!
//! Errors from both layers are aggregated into one deterministic ordering:
//! contract errors first, schema errors second, so retries produce identical
//! diagnostics for identical bad input.

use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::DocumentValidator;

mod contracts;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// One validation failure: a pointer into the payload, a message, and
/// diagnostic parameters. Always reported as part of the full error set,
/// never single-shot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Pointer into the payload (dot path for contracts, JSON pointer for schema errors)
    pub location: String,
    /// Human-readable failure message
    pub message: String,
    /// Diagnostic parameters for the failing rule
    pub params: Value,
}

// ============================================================================
// FIELD CONTRACT RULES
// ============================================================================

/// A per-field structural/format rule applied before document-schema
/// validation.
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    /// Value must be a string with non-whitespace content
    NonEmptyString,
    /// String must match the regex pattern
    Pattern(&'static str),
    /// String must parse as a UUID
    Uuid,
    /// Value must be a JSON number, optionally bounded below
    Numeric { min: Option<f64> },
    /// Value must be a boolean
    Boolean,
    /// Value must be a JSON object
    Object,
    /// Value must be an array with at least `min_len` items
    Array { min_len: usize },
    /// String must be one of the listed values
    OneOf(&'static [&'static str]),
    /// String must parse as an ISO 8601 timestamp
    Iso8601,
}

/// Declarative contract for one payload field.
#[derive(Debug, Clone, Copy)]
pub struct Contract {
    /// Dot path into the payload (`market.karmaWage`, `payload.content`)
    pub field: &'static str,
    /// Rules applied in declaration order
    pub rules: &'static [FieldRule],
    /// Optional fields are only checked when present
    pub optional: bool,
}

// ============================================================================
// COMPILED CONTRACT TABLE
// ============================================================================

/// A contract rule with its pattern compiled.
enum CompiledRule {
    NonEmptyString,
    Pattern(Regex),
    Uuid,
    Numeric { min: Option<f64> },
    Boolean,
    Object,
    Array { min_len: usize },
    OneOf(&'static [&'static str]),
    Iso8601,
}

struct CompiledContract {
    field: &'static str,
    optional: bool,
    rules: Vec<CompiledRule>,
}

/// Field contracts indexed by workflow identifier, with all regex patterns
/// compiled at startup. A broken pattern is a configuration error and aborts
/// startup rather than failing requests one at a time.
pub struct ContractTable {
    contracts: HashMap<&'static str, Vec<CompiledContract>>,
}

impl ContractTable {
    /// Compiles the full contract table.
    pub fn new() -> Result<Self> {
        let mut table = HashMap::new();
        for (workflow, declared) in contracts::CONTRACTS {
            let mut compiled = Vec::with_capacity(declared.len());
            for contract in *declared {
                compiled.push(CompiledContract {
                    field: contract.field,
                    optional: contract.optional,
                    rules: compile_rules(contract.rules)
                        .with_context(|| format!("Contract for {}.{}", workflow, contract.field))?,
                });
            }
            table.insert(*workflow, compiled);
        }
        Ok(Self { contracts: table })
    }

    /// Runs the field contracts for a workflow against a payload.
    ///
    /// All fields are checked and all failures collected; an endpoint with no
    /// declared contracts passes trivially.
    pub fn run(&self, workflow: &str, payload: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let contracts = match self.contracts.get(workflow) {
            Some(contracts) => contracts,
            None => return errors,
        };

        for contract in contracts {
            let value = resolve(payload, contract.field);
            match value {
                None => {
                    if !contract.optional {
                        errors.push(ValidationError {
                            location: contract.field.to_string(),
                            message: "is required".to_string(),
                            params: serde_json::json!({ "rule": "required" }),
                        });
                    }
                }
                Some(value) => {
                    for rule in &contract.rules {
                        if let Some(error) = check_rule(rule, contract.field, value) {
                            errors.push(error);
                        }
                    }
                }
            }
        }

        errors
    }
}

/// Composes the two validation layers for one request.
///
/// Contract errors come first, schema errors second; either layer failing
/// means the handler must not run.
pub fn validate_request(
    table: &ContractTable,
    workflow: &str,
    validator: &DocumentValidator,
    payload: &Value,
) -> Vec<ValidationError> {
    let mut errors = table.run(workflow, payload);
    errors.extend(validator.validate(payload));
    errors
}

// ============================================================================
// RULE EVALUATION
// ============================================================================

fn compile_rules(rules: &[FieldRule]) -> Result<Vec<CompiledRule>> {
    rules
        .iter()
        .map(|rule| {
            Ok(match rule {
                FieldRule::NonEmptyString => CompiledRule::NonEmptyString,
                FieldRule::Pattern(pattern) => CompiledRule::Pattern(
                    Regex::new(pattern)
                        .with_context(|| format!("Invalid contract pattern: {}", pattern))?,
                ),
                FieldRule::Uuid => CompiledRule::Uuid,
                FieldRule::Numeric { min } => CompiledRule::Numeric { min: *min },
                FieldRule::Boolean => CompiledRule::Boolean,
                FieldRule::Object => CompiledRule::Object,
                FieldRule::Array { min_len } => CompiledRule::Array { min_len: *min_len },
                FieldRule::OneOf(values) => CompiledRule::OneOf(values),
                FieldRule::Iso8601 => CompiledRule::Iso8601,
            })
        })
        .collect()
}

/// Resolves a dot path into a payload value.
fn resolve<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn failure(field: &str, message: &str, rule: &str) -> ValidationError {
    ValidationError {
        location: field.to_string(),
        message: message.to_string(),
        params: serde_json::json!({ "rule": rule }),
    }
}

fn check_rule(rule: &CompiledRule, field: &str, value: &Value) -> Option<ValidationError> {
    match rule {
        CompiledRule::NonEmptyString => match value.as_str() {
            Some(s) if !s.trim().is_empty() => None,
            _ => Some(failure(field, "must be a non-empty string", "isString")),
        },
        CompiledRule::Pattern(regex) => match value.as_str() {
            Some(s) if regex.is_match(s) => None,
            _ => Some(ValidationError {
                location: field.to_string(),
                message: "has invalid format".to_string(),
                params: serde_json::json!({ "rule": "matches", "pattern": regex.as_str() }),
            }),
        },
        CompiledRule::Uuid => match value.as_str() {
            Some(s) if uuid::Uuid::parse_str(s).is_ok() => None,
            _ => Some(failure(field, "must be a valid UUID", "isUUID")),
        },
        CompiledRule::Numeric { min } => match value.as_f64() {
            Some(number) => match min {
                Some(min) if number < *min => Some(ValidationError {
                    location: field.to_string(),
                    message: format!("must be at least {}", min),
                    params: serde_json::json!({ "rule": "isFloat", "min": min }),
                }),
                _ => None,
            },
            None => Some(failure(field, "must be a number", "isNumeric")),
        },
        CompiledRule::Boolean => {
            if value.is_boolean() {
                None
            } else {
                Some(failure(field, "must be a boolean", "isBoolean"))
            }
        }
        CompiledRule::Object => {
            if value.is_object() {
                None
            } else {
                Some(failure(field, "must be an object", "isObject"))
            }
        }
        CompiledRule::Array { min_len } => match value.as_array() {
            Some(items) if items.len() >= *min_len => None,
            Some(_) => Some(ValidationError {
                location: field.to_string(),
                message: format!("must have at least {} item(s)", min_len),
                params: serde_json::json!({ "rule": "isArray", "min": min_len }),
            }),
            None => Some(failure(field, "must be an array", "isArray")),
        },
        CompiledRule::OneOf(values) => match value.as_str() {
            Some(s) if values.contains(&s) => None,
            _ => Some(ValidationError {
                location: field.to_string(),
                message: format!("must be one of: {}", values.join(", ")),
                params: serde_json::json!({ "rule": "isIn", "values": values }),
            }),
        },
        CompiledRule::Iso8601 => match value.as_str() {
            Some(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => None,
            _ => Some(failure(field, "must be a valid ISO 8601 date", "isISO8601")),
        },
    }
}

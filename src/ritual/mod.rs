//! Ritual Step Interpreter Module
//!
//! A specialized request pipeline for ritual payloads. The interpreter:
//! 1. Validates the payload against the ritual document schema (aggregated
//!    errors on failure) and enforces the extra runtime guard that `rituals`
//!    must be an array
//! 2. Extracts metadata (audit only), NLP configuration (with model/language
//!    defaults), and the ordered step list into per-request working state
//! 3. Derives one intent mapping per `nlp.mapIntent` entry, resolving each
//!    `nl_phrase` from the first step whose `function` matches the mapped
//!    action (best-effort enrichment, never an error)
//! 4. Executes every step in declaration order, one at a time, collecting a
//!    result per handled step and short-circuiting on the first failure
//!
//! All working state lives in a request-scoped [`RitualContext`]; nothing is
//! stored on shared process state, so concurrent requests cannot observe each
//! other's intents or step results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::schema::DocumentValidator;
use crate::validate::ValidationError;

/// NLP model applied when the payload does not name one.
pub const DEFAULT_NLP_MODEL: &str = "grok_3";
/// NLP language applied when the payload does not name one.
pub const DEFAULT_NLP_LANGUAGE: &str = "en";

// ============================================================================
// PAYLOAD TYPES
// ============================================================================

/// One unit of ritual execution.
///
/// Steps are ordered; defined order is execution order. No reordering, no
/// implicit parallelism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step identifier
    pub id: String,
    /// Step kind (`blockchain_operation`, `call`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Natural-language label for the step
    #[serde(default)]
    pub nl_phrase: Option<String>,
    /// Parameters for chain-operation steps
    #[serde(default)]
    pub params: Option<Value>,
    /// Arguments for call steps
    #[serde(default)]
    pub args: Option<Value>,
    /// Function name for call steps (also the intent-map join key)
    #[serde(default)]
    pub function: Option<String>,
}

/// The `nlp` section of a ritual payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NlpSection {
    /// Intent name to action name mapping
    #[serde(rename = "mapIntent", default)]
    pub map_intent: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Typed view of a ritual payload, extracted after schema validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RitualRequest {
    /// Audit/log correlation only - never validated beyond existence
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub nlp: Option<NlpSection>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Must be an array; enforced before typed extraction
    #[serde(default)]
    pub rituals: Vec<Value>,
}

// ============================================================================
// DERIVED / RESULT TYPES
// ============================================================================

/// Derived per-request NLP configuration with defaults applied.
#[derive(Debug, Clone, Serialize)]
pub struct NlpConfig {
    pub intent_map: std::collections::BTreeMap<String, String>,
    pub model: String,
    pub language: String,
}

/// One derived intent mapping. Recomputed per request, discarded after the
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMapping {
    pub intent: String,
    pub action: String,
    /// Resolved from the first step whose `function` matches `action`;
    /// absent when no step matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nl_phrase: Option<String>,
}

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
}

/// Per-request working state. Built fresh for every request and dropped at
/// response time; storing this on process-wide state would race under
/// concurrency.
#[derive(Debug, Clone)]
pub struct RitualContext {
    pub metadata: Value,
    pub nlp: Option<NlpConfig>,
    pub steps: Vec<Step>,
    pub intents: Vec<IntentMapping>,
}

/// Terminal success state: metadata echo, derived intents, and one result
/// per handled step.
#[derive(Debug, Clone, Serialize)]
pub struct RitualOutcome {
    pub metadata: Value,
    pub intents: Vec<IntentMapping>,
    pub results: Vec<StepResult>,
}

/// Terminal failure states of the interpreter.
#[derive(Debug, Error)]
pub enum RitualError {
    #[error("Validation failed")]
    Validation(Vec<ValidationError>),
    #[error("Rituals must be an array")]
    RitualsNotArray,
    #[error("Malformed ritual payload: {0}")]
    Malformed(String),
    #[error("No steps provided")]
    NoSteps,
    #[error("Step execution failed: {0}")]
    Execution(String),
}

// ============================================================================
// INTERPRETER
// ============================================================================

/// Runs the full interpreter state machine over one request payload.
///
/// # Arguments
///
/// * `payload` - Raw request body
/// * `validator` - The ritual document validator from the schema registry
///
/// # Returns
///
/// - `Ok(RitualOutcome)` - At least one step executed, results recorded
/// - `Err(RitualError)` - Validation failure, missing steps, or execution error
pub fn interpret(payload: &Value, validator: &DocumentValidator) -> Result<RitualOutcome, RitualError> {
    let context = build_context(payload, validator)?;
    let results = execute_steps(&context)?;

    info!("Ritual executed: {} step result(s)", results.len());
    Ok(RitualOutcome {
        metadata: context.metadata,
        intents: context.intents,
        results,
    })
}

/// Validates the payload and extracts the per-request context.
///
/// Runs document-schema validation first, then the rituals-array runtime
/// guard (an additional type check layered on top of schema validation),
/// then the typed extraction and intent derivation.
pub fn build_context(
    payload: &Value,
    validator: &DocumentValidator,
) -> Result<RitualContext, RitualError> {
    let errors = validator.validate(payload);
    if !errors.is_empty() {
        warn!("Ritual validation failed: {} error(s)", errors.len());
        return Err(RitualError::Validation(errors));
    }

    // Schema validation alone may accept other shapes here; reject anyway.
    if !payload.get("rituals").map(Value::is_array).unwrap_or(false) {
        return Err(RitualError::RitualsNotArray);
    }

    let request: RitualRequest = serde_json::from_value(payload.clone())
        .map_err(|e| RitualError::Malformed(e.to_string()))?;

    info!(
        "Ritual metadata: schema_version={:?} function={:?}",
        request.metadata.get("schema_version"),
        request.metadata.get("function"),
    );

    let nlp = request.nlp.as_ref().map(|section| NlpConfig {
        intent_map: section.map_intent.clone(),
        model: section
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_NLP_MODEL.to_string()),
        language: section
            .language
            .clone()
            .unwrap_or_else(|| DEFAULT_NLP_LANGUAGE.to_string()),
    });
    if let Some(ref config) = nlp {
        debug!("NLP config initialized: model={} language={}", config.model, config.language);
    }

    let intents = derive_intents(&nlp, &request.steps);
    debug!("Loaded {} ritual step(s)", request.steps.len());

    Ok(RitualContext {
        metadata: request.metadata,
        nlp,
        steps: request.steps,
        intents,
    })
}

/// Builds one intent mapping per `mapIntent` entry.
///
/// Each `nl_phrase` is resolved by the first step in declaration order whose
/// `function` equals the mapped action. No match leaves the phrase unset.
fn derive_intents(nlp: &Option<NlpConfig>, steps: &[Step]) -> Vec<IntentMapping> {
    let config = match nlp {
        Some(config) => config,
        None => return Vec::new(),
    };

    config
        .intent_map
        .iter()
        .map(|(intent, action)| IntentMapping {
            intent: intent.clone(),
            action: action.clone(),
            nl_phrase: steps
                .iter()
                .find(|step| step.function.as_deref() == Some(action.as_str()))
                .and_then(|step| step.nl_phrase.clone()),
        })
        .collect()
}

/// Executes the step list in declaration order.
///
/// Exactly one step is dispatched at a time; the first failure
/// short-circuits. Unhandled step kinds produce no result (logged as a gap,
/// not silently broadened into success).
fn execute_steps(context: &RitualContext) -> Result<Vec<StepResult>, RitualError> {
    if context.steps.is_empty() {
        warn!("No ritual steps to execute");
        return Err(RitualError::NoSteps);
    }

    let mut results = Vec::new();
    for step in &context.steps {
        if let Some(result) = execute_step(step, context)? {
            results.push(result);
        }
    }
    Ok(results)
}

/// Dispatches a single step by type.
///
/// `blockchain_operation` triggers the chain-operation path keyed by the
/// step's parameters; `call` triggers an NLP-driven action only when an NLP
/// configuration was established for this request. Any other type is
/// currently unhandled and yields no result.
fn execute_step(step: &Step, context: &RitualContext) -> Result<Option<StepResult>, RitualError> {
    info!(
        "Executing step: id={} type={} nl_phrase={:?}",
        step.id, step.kind, step.nl_phrase
    );

    match step.kind.as_str() {
        "blockchain_operation" => {
            info!(
                "Executing blockchain operation: {:?} params={:?}",
                step.nl_phrase, step.params
            );
            Ok(Some(StepResult {
                status: "success".to_string(),
                operation: Some(step.id.clone()),
                call: None,
            }))
        }
        "call" if context.nlp.is_some() => {
            info!("Executing NLP call: {:?} args={:?}", step.nl_phrase, step.args);
            Ok(Some(StepResult {
                status: "success".to_string(),
                operation: None,
                call: step.function.clone(),
            }))
        }
        other => {
            warn!("Unhandled step type '{}' for step {}", other, step.id);
            Ok(None)
        }
    }
}

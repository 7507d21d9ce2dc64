//! Dispatcher Module
//!
//! Builds the canonical `{workflow, params}` call and delegates it to the
//! external workflow backend. The dispatcher performs no retry, no timeout,
//! and no idempotency tracking - those guarantees, if any, belong to the
//! backend. The workflow identifier is always `"{module}-{action}"`; it is
//! the contract key the backend must agree on.

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, error};

/// Client for the external workflow execution backend.
///
/// One suspension point per request: the single backend call. No internal
/// parallel fan-out.
#[derive(Clone)]
pub struct WorkflowClient {
    base_url: String,
    http: reqwest::Client,
}

impl WorkflowClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Executes a named workflow with the validated request payload.
    ///
    /// POSTs `{workflow, params}` to `<base_url>/execute` and returns the
    /// backend's JSON result. Any transport failure, non-success status, or
    /// unparsable body surfaces as an error; the caller wraps it into the
    /// uniform failure envelope.
    ///
    /// # Arguments
    ///
    /// * `workflow` - Workflow identifier (`module-action`)
    /// * `params` - Raw validated request payload
    pub async fn execute(&self, workflow: &str, params: Value) -> Result<Value> {
        debug!("Dispatching workflow {}", workflow);

        let request = serde_json::json!({
            "workflow": workflow,
            "params": params,
        });

        let response = self
            .http
            .post(format!("{}/execute", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Workflow backend request failed for {}: {}", workflow, e);
                anyhow::anyhow!("Workflow backend request failed: {}", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the backend's own error message when it sent one
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("error")
                        .and_then(Value::as_str)
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| format!("Workflow backend returned status {}", status));
            error!("Workflow {} failed: {}", workflow, message);
            return Err(anyhow::anyhow!(message));
        }

        let result = response
            .json::<Value>()
            .await
            .map_err(|e| anyhow::anyhow!("Invalid workflow backend response: {}", e))?;

        Ok(result)
    }
}

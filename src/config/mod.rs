//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the gateway.
//! Configuration includes API server settings, the JWT verification secret,
//! the schema document location, and the workflow backend endpoint.

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
///
/// This structure holds configuration for:
/// - API server binding and CORS settings
/// - Token verification (shared secret)
/// - Schema document location
/// - Workflow backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration (host, port, CORS settings)
    pub api: ApiConfig,
    /// Authentication configuration (JWT shared secret)
    pub auth: AuthConfig,
    /// Schema registry configuration (document directory)
    pub schema: SchemaConfig,
    /// Workflow backend configuration (where validated requests are dispatched)
    pub workflow: WorkflowConfig,
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    pub host: String,
    /// Port number to bind the API server to
    pub port: u16,
    /// Allowed CORS origins for cross-origin requests
    pub cors_origins: Vec<String>,
}

/// Authentication configuration.
///
/// The shared secret must be present before the gateway serves traffic.
/// A missing secret is a startup error, never a per-request auth failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify bearer tokens (HS256)
    #[serde(default)]
    pub jwt_secret: String,
}

/// Schema registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Directory containing `*.schema.json` documents (searched recursively)
    pub dir: String,
}

/// Workflow backend configuration.
///
/// The gateway dispatches every validated request to this backend as
/// `{workflow: "module-action", params}` and performs no retries itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Base URL of the workflow execution backend
    pub base_url: String,
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates the configuration.
    ///
    /// This function ensures that:
    /// - The JWT secret is present and non-empty (auth cannot function without it)
    /// - The workflow backend URL is present
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - Configuration is incomplete
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: auth.jwt_secret is missing. Set it in the config file \
                or via the JWT_SECRET environment variable. The gateway refuses to start \
                without a verification secret."
            ));
        }

        if self.workflow.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: workflow.base_url is missing. The gateway has no \
                workflow backend to dispatch to."
            ));
        }

        Ok(())
    }

    /// Loads configuration from the TOML file.
    ///
    /// This function:
    /// 1. Resolves the config path (GATEWAY_CONFIG_PATH env var or config/gateway.toml)
    /// 2. Loads and parses the configuration
    /// 3. Applies the JWT_SECRET environment override if present
    /// 4. Validates the configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - Failed to load configuration, file doesn't exist, or validation failed
    pub fn load() -> anyhow::Result<Self> {
        // Check for custom config path via environment variable (for tests)
        let config_path = std::env::var("GATEWAY_CONFIG_PATH")
            .unwrap_or_else(|_| "config/gateway.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&content)?;
            // Environment override takes precedence over the file value
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                config.auth.jwt_secret = secret;
            }
            config.validate()?;
            Ok(config)
        } else {
            // Configuration file doesn't exist - user needs to copy template
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/gateway.template.toml config/gateway.toml\n\
                Then edit config/gateway.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Creates a default configuration with placeholder values.
    ///
    /// This configuration is suitable for local development and testing.
    /// For production use, the JWT secret and the workflow backend URL must
    /// be replaced with actual values.
    #[allow(dead_code)]
    pub fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            auth: AuthConfig {
                jwt_secret: "dev-secret".to_string(),
            },
            schema: SchemaConfig {
                dir: "schema".to_string(),
            },
            workflow: WorkflowConfig {
                base_url: "http://127.0.0.1:4000".to_string(),
            },
        }
    }
}

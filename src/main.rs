//! Sovereign Gateway Service
//!
//! A schema-driven HTTP API gateway. At startup the service loads a tree of
//! JSON schema documents, compiles one endpoint descriptor per module/action
//! leaf of the root API schema, and serves those endpoints with a fail-fast
//! request pipeline: bearer-token authentication, field-contract validation,
//! document-schema validation, then dispatch to the external workflow backend.
//!
//! ## Overview
//!
//! The gateway is a thin routing and validation layer:
//! 1. Loads schema documents and enforces the critical subset at startup
//! 2. Compiles the endpoint descriptor table from the root API schema
//! 3. Serves requests, delegating all business logic to named workflows
//! 4. Interprets ritual payloads (metadata/nlp/steps) with a typed step engine
//!
//! The gateway performs no persistence and no workflow execution of its own.

use anyhow::Result;
use tracing::info;

mod api;
mod auth;
mod config;
mod dispatch;
mod ritual;
mod routes;
mod schema;
mod validate;

use config::Config;
use schema::SchemaRegistry;

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point that initializes and runs the gateway.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Loads the schema registry (fatal if a critical schema is broken)
/// 4. Compiles the endpoint table from the root API schema
/// 5. Starts the API server and runs until shutdown
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging for debugging and monitoring
    tracing_subscriber::fmt::init();

    info!("Starting Sovereign Gateway");

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for help flag
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("Sovereign Gateway");
        println!();
        println!("Usage: sovereign-gateway [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <path>        Use custom config file path");
        println!("  --emit-routes <path>   Regenerate the routing module from the root schema and exit");
        println!("  --help, -h             Show this help message");
        println!();
        println!("Environment variables:");
        println!("  GATEWAY_CONFIG_PATH    Path to config file (overrides --config)");
        println!("  JWT_SECRET             Shared secret for token verification (overrides config file)");
        return Ok(());
    }

    // Check for custom config path
    let mut config_path = None;
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
            break;
        }
    }

    if let Some(path) = config_path {
        std::env::set_var("GATEWAY_CONFIG_PATH", &path);
        info!("Using custom config: {}", path);
    }

    // Load configuration (validates the JWT secret and workflow URL up front,
    // so a misconfigured gateway never serves traffic)
    let config = Config::load()?;
    info!("Configuration loaded successfully");

    // Load the schema registry; a broken critical schema aborts startup here
    let registry = SchemaRegistry::load(&config.schema.dir, schema::CRITICAL_SCHEMAS)?;
    info!("Schema registry loaded: {} documents", registry.len());

    // Optional codegen mode: regenerate the routing module and exit.
    // Write failure is fatal and reported with a non-zero exit status.
    for (i, arg) in args.iter().enumerate() {
        if arg == "--emit-routes" && i + 1 < args.len() {
            let api_schema = registry
                .document(routes::ROOT_SCHEMA)
                .ok_or_else(|| anyhow::anyhow!("Root schema '{}' not found", routes::ROOT_SCHEMA))?;
            let descriptors = routes::compile(api_schema)?;
            routes::write_generated(&descriptors, &args[i + 1])?;
            info!("Generated routes at {}", args[i + 1]);
            return Ok(());
        }
    }

    // Build the API server (compiles the endpoint table, contract table, and
    // per-endpoint document validators)
    let api_server = api::ApiServer::new(config, registry)?;

    // Run the service (this blocks until shutdown)
    api_server.run().await?;

    Ok(())
}

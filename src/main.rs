//! Provider entry point.
//!
//! Loads configuration, registers the configured built-in tool sets and
//! serves them over the configured transport.

use anyhow::Result;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use tool_dispatch::core::{Config, Error, TransportService};
use tool_dispatch::domains::tools::ToolRegistry;
use tool_dispatch::domains::tools::definitions::{register_math_tools, register_search_tools};
use tool_dispatch::server::Dispatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    let tools = build_tools(&config.server.tool_sets)?;
    info!("Serving {} tools: {}", tools.len(), tools.names().join(", "));

    let dispatcher = Arc::new(
        Dispatcher::new(config.server.name.clone(), Arc::new(tools))
            .with_version(config.server.version.clone()),
    );

    TransportService::new(config.transport).run(dispatcher).await?;

    info!("Provider shutting down");

    Ok(())
}

/// Register the named built-in tool sets.
fn build_tools(sets: &[String]) -> Result<ToolRegistry, Error> {
    let registry = ToolRegistry::new();
    for set in sets {
        match set.as_str() {
            "math" => register_math_tools(&registry)?,
            "search" => register_search_tools(&registry)?,
            other => return Err(Error::config(format!("unknown tool set `{}`", other))),
        }
    }
    Ok(registry)
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout belongs to the STDIO transport.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

//! Swagger MCP Server Entry Point
//!
//! Initializes logging, loads configuration, runs the initial discovery pass
//! and starts the server with the configured transport.

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use swagger_mcp_server::core::{Config, SwaggerMcpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);
    config.validate()?;

    let transport = TransportService::new(config.transport.clone());
    let server = SwaggerMcpServer::new(config)?;

    // A server without its catalog is useless, so discovery failure is fatal.
    let tools = server
        .refresh()
        .await
        .context("initial discovery of the API description failed")?;
    info!("Server initialized with {} tools", tools);

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format. Output goes
/// to stderr so that stdout stays free for the stdio transport.
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
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

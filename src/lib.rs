//! Swagger MCP Server Library
//!
//! Exposes the operations of a REST API, described by a Swagger 2.0 or
//! OpenAPI 3.x document, as Model Context Protocol tools.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP handler and transports
//! - **domains**: business logic organized by bounded contexts
//!   - **discovery**: fetches and parses the description, builds the catalog
//!   - **tools**: tool model, input schemas, invocation and the registry
//!
//! # Example
//!
//! ```rust,no_run
//! use swagger_mcp_server::{core::Config, core::SwaggerMcpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!     let server = SwaggerMcpServer::new(config)?;
//!     let tools = server.refresh().await?;
//!     println!("{} tools available", tools);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, Result, SwaggerMcpServer};

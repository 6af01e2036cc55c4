//! Discovery domain.
//!
//! Loads a Swagger/OpenAPI description and turns its operations into a tool
//! catalog.

pub mod builder;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod service;

pub use builder::{build_catalog, synthesize_id};
pub use error::DiscoveryError;
pub use fetch::{DescriptionFetcher, HttpFetcher};
pub use parser::{Backend, ParsedDocument, parse_document};
pub use service::{DiscoveryService, discover_text};

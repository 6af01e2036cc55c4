//! Tools domain module.
//!
//! Every operation of the loaded API description is exposed as a tool that
//! MCP clients can list and call.
//!
//! ## Architecture
//!
//! - `model.rs` - Tool definitions, parameters and argument values
//! - `catalog.rs` - The ordered set of tools from one discovery pass
//! - `schema.rs` - JSON Schema synthesis for tool inputs
//! - `invoker.rs` - Executes a tool against the live API
//! - `registry.rs` - Published catalog, refresh and dispatch
//! - `error.rs` - Tool-specific error types

pub mod catalog;
mod error;
pub mod invoker;
pub mod model;
mod registry;
pub mod schema;

pub use catalog::Catalog;
pub use error::ToolError;
pub use invoker::{DELETED_MARKER, InvocationEngine};
pub use model::{
    ArgValue, Arguments, HttpMethod, ParamLocation, ParamType, ParameterDescriptor,
    ToolDefinition, arguments_from_json,
};
pub use registry::{ToolRegistry, to_tool};
pub use schema::schema_for;

//! Domains module containing business logic organized by bounded contexts.
//!
//! - **discovery**: loading an API description and building the tool catalog
//! - **tools**: the catalog model, input schemas and invocation against the API

pub mod discovery;
pub mod tools;

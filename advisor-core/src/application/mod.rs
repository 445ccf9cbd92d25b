//! # Application Module
//!
//! ## Submodules
//!
//! - [`deadline`] - the timeout guard wrapped around every unreliable call
//! - [`tooling`] - MCP tool connections over SSE and stdio
//! - [`namespace`] - merges discovered tools into one namespace
//! - [`session`] - builds the agent session once per process
//! - [`agent`] - streams a conversation through a ready session

pub mod agent;
pub mod deadline;
pub mod namespace;
pub mod session;
pub mod tooling;

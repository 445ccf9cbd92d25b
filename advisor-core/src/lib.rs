//! # advisor-core
//!
//! Orchestrates access to external MCP tool servers on behalf of a
//! language-model agent and streams the agent's replies back to callers.
//!
//! ## Layers
//!
//! - [`domain`] - conversation types shared by every layer
//! - [`config`] - TOML configuration and validation
//! - [`application`] - deadlines, tool connections, the tool namespace,
//!   the agent session manager and the conversation stream adapter
//! - [`infrastructure`] - the model provider client, the HTTP surface and
//!   the mock tool server

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, deadline, namespace, session, tooling};
pub use config::AppConfig;
pub use domain::types;
pub use infrastructure::{mock, model, server};

//! Local MCP server speaking the SSE transport, with canned answers for the
//! `solve_constraint` and `get_instances` tools. Used for development and by
//! the integration tests in place of the real constraint solver and
//! instance catalog.

mod catalog;
mod server;

pub use catalog::{handle_rpc, mock_tools};
pub use server::{router, serve, serve_listener};

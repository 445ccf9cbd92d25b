//! MCP tool connections.
//!
//! A [`ToolConnection`] owns one endpoint: it opens a [`ToolTransport`]
//! (SSE or stdio), runs the MCP handshake and lists the server's tools as
//! [`ToolDescriptor`]s whose [`ToolHandle`] invokes `tools/call`.

mod connection;
mod descriptor;
mod error;
mod interface;
mod process;
mod protocol;
mod rpc;
mod sse;

pub use connection::{ConnectionState, ToolConnection, open_transport};
pub use descriptor::{ToolDescriptor, ToolHandle};
pub use error::{ConnectError, ConnectPhase, ToolInvokeError};
pub use interface::ToolTransport;
pub use process::StdioTransport;
pub use protocol::{McpPeer, RemoteTool, ToolCallOutput};
pub use sse::SseTransport;

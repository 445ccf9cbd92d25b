use crate::application::deadline::DeadlineExceeded;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("failed to spawn MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MCP server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("MCP server '{server}' answered HTTP {status}")]
    Http { server: String, status: u16 },
    #[error("MCP server '{server}' handshake failed: {message}")]
    Handshake { server: String, message: String },
    #[error("MCP server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("MCP server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("MCP server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("MCP server '{server}' request cancelled")]
    Cancelled { server: String },
}

impl ToolInvokeError {
    pub fn transport(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            server: server.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPhase {
    Connect,
    Discover,
}

impl fmt::Display for ConnectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectPhase::Connect => f.write_str("connection"),
            ConnectPhase::Discover => f.write_str("tool discovery"),
        }
    }
}

/// Failure of one tool connection while a session is being built.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to tool server '{server}': {source}")]
    Connection {
        server: String,
        #[source]
        source: ToolInvokeError,
    },
    #[error("tool discovery failed for server '{server}': {source}")]
    Discovery {
        server: String,
        #[source]
        source: ToolInvokeError,
    },
    #[error("tool server '{server}' timed out during {phase}: {source}")]
    Timeout {
        server: String,
        phase: ConnectPhase,
        #[source]
        source: DeadlineExceeded,
    },
    #[error("tool server '{server}' is not connected")]
    NotConnected { server: String },
}

impl ConnectError {
    pub fn server(&self) -> &str {
        match self {
            ConnectError::Connection { server, .. }
            | ConnectError::Discovery { server, .. }
            | ConnectError::Timeout { server, .. }
            | ConnectError::NotConnected { server } => server,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectError::Timeout { .. })
    }
}

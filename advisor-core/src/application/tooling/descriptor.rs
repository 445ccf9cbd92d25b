use super::error::ToolInvokeError;
use super::interface::ToolTransport;
use super::protocol::{self, RemoteTool, ToolCallOutput};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Invokes one remote tool on the connection that advertised it.
#[derive(Clone)]
pub struct ToolHandle {
    transport: Arc<dyn ToolTransport>,
    remote_name: String,
}

impl ToolHandle {
    pub fn new(transport: Arc<dyn ToolTransport>, remote_name: impl Into<String>) -> Self {
        Self {
            transport,
            remote_name: remote_name.into(),
        }
    }

    pub async fn invoke(&self, arguments: Value) -> Result<ToolCallOutput, ToolInvokeError> {
        protocol::call_tool(self.transport.as_ref(), &self.remote_name, arguments).await
    }
}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolHandle")
            .field("server", &self.transport.server())
            .field("tool", &self.remote_name)
            .finish()
    }
}

/// A named, described, invocable tool. Produced by discovery; the namespace
/// keys descriptors by [`ToolDescriptor::name`].
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    name: String,
    description: Option<String>,
    input_schema: Value,
    server: String,
    handle: ToolHandle,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        input_schema: Value,
        server: impl Into<String>,
        handle: ToolHandle,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            input_schema,
            server: server.into(),
            handle,
        }
    }

    pub(super) fn from_remote(tool: RemoteTool, transport: &Arc<dyn ToolTransport>) -> Self {
        let server = transport.server().to_string();
        let handle = ToolHandle::new(Arc::clone(transport), tool.name.clone());
        Self::new(tool.name, tool.description, tool.input_schema, server, handle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Name of the connection that advertised this tool.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn invoke(&self, arguments: Value) -> Result<ToolCallOutput, ToolInvokeError> {
        self.handle.invoke(arguments).await
    }
}

impl PartialEq for ToolDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.input_schema == other.input_schema
            && self.server == other.server
    }
}

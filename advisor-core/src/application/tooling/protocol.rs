use super::error::ToolInvokeError;
use super::interface::ToolTransport;
use crate::constants::MCP_PROTOCOL_VERSION;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on `tools/list` pages, guarding against servers that keep
/// returning the same cursor.
const MAX_LIST_PAGES: usize = 64;

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTool {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Result of `tools/call`. `text` joins every text content part.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallOutput {
    pub raw: Value,
    pub text: String,
    pub is_error: bool,
}

impl ToolCallOutput {
    pub fn from_result(raw: Value) -> Self {
        let text = raw
            .get("content")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        let is_error = raw
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self {
            raw,
            text,
            is_error,
        }
    }

    /// Value handed back to the model: `structuredContent` when present,
    /// otherwise the joined text.
    pub fn model_value(&self) -> Value {
        match self.raw.get("structuredContent") {
            Some(structured) if !structured.is_null() => structured.clone(),
            _ => Value::String(self.text.clone()),
        }
    }
}

/// An initialized MCP session over some transport.
#[derive(Clone)]
pub struct McpPeer {
    transport: Arc<dyn ToolTransport>,
    instructions: Option<String>,
}

impl McpPeer {
    /// Run the `initialize` / `notifications/initialized` handshake.
    pub async fn initialize(transport: Arc<dyn ToolTransport>) -> Result<Self, ToolInvokeError> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {}
        });
        let init_result = transport.request("initialize", params).await?;
        if !init_result.is_object() {
            return Err(ToolInvokeError::Handshake {
                server: transport.server().to_string(),
                message: "initialize returned a non-object result".to_string(),
            });
        }
        let instructions = init_result
            .get("instructions")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(version) = init_result.get("protocolVersion").and_then(Value::as_str) {
            if version != MCP_PROTOCOL_VERSION {
                debug!(
                    server = transport.server(),
                    version, "server negotiated a different protocol revision"
                );
            }
        }

        transport
            .notify("notifications/initialized", json!({}))
            .await?;

        Ok(Self {
            transport,
            instructions,
        })
    }

    pub fn server(&self) -> &str {
        self.transport.server()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn transport(&self) -> Arc<dyn ToolTransport> {
        Arc::clone(&self.transport)
    }

    /// List every tool the server offers, following `nextCursor`.
    pub async fn list_tools(&self) -> Result<Vec<RemoteTool>, ToolInvokeError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let page = self.transport.request("tools/list", params).await?;
            let Some(entries) = page.get("tools").and_then(Value::as_array) else {
                return Err(ToolInvokeError::Handshake {
                    server: self.server().to_string(),
                    message: "tools/list result has no 'tools' array".to_string(),
                });
            };
            tools.extend(entries.iter().filter_map(|entry| self.parse_tool(entry)));

            cursor = page
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|next| !next.is_empty())
                .map(str::to_string);
            if cursor.is_none() {
                return Ok(tools);
            }
        }

        warn!(
            server = self.server(),
            pages = MAX_LIST_PAGES,
            "tools/list pagination did not terminate"
        );
        Err(ToolInvokeError::Handshake {
            server: self.server().to_string(),
            message: format!(
                "tools/list pagination did not terminate after {MAX_LIST_PAGES} pages"
            ),
        })
    }

    fn parse_tool(&self, entry: &Value) -> Option<RemoteTool> {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            warn!(server = self.server(), "skipping tool without a name");
            return None;
        };
        let description = entry
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let input_schema = entry
            .get("inputSchema")
            .filter(|schema| schema.is_object())
            .cloned()
            .unwrap_or_else(|| json!({ "type": "object" }));
        Some(RemoteTool {
            name: name.to_string(),
            description,
            input_schema,
        })
    }

    pub async fn call_tool(
        &self,
        tool: &str,
        arguments: Value,
    ) -> Result<ToolCallOutput, ToolInvokeError> {
        call_tool(self.transport.as_ref(), tool, arguments).await
    }
}

pub(super) async fn call_tool(
    transport: &dyn ToolTransport,
    tool: &str,
    arguments: Value,
) -> Result<ToolCallOutput, ToolInvokeError> {
    let params = json!({
        "name": tool,
        "arguments": match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other,
        }
    });
    let result = transport.request("tools/call", params).await?;
    Ok(ToolCallOutput::from_result(result))
}

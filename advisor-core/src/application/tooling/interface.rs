use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolInvokeError;

/// A JSON-RPC channel to one MCP server. `request` resolves with the
/// response's `result` member; JSON-RPC errors surface as
/// [`ToolInvokeError::Rpc`].
#[async_trait]
pub trait ToolTransport: Send + Sync {
    fn server(&self) -> &str;

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError>;

    async fn notify(&self, method: &str, params: Value) -> Result<(), ToolInvokeError>;
}

use crate::constants::MCP_PROTOCOL_VERSION;
use serde_json::{Value, json};
use tracing::debug;

const METHOD_NOT_FOUND: i64 = -32601;

/// Tool definitions advertised by `tools/list`.
pub fn mock_tools() -> Vec<Value> {
    vec![
        json!({
            "name": "solve_constraint",
            "description": "Solve a MiniZinc constraint satisfaction problem",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "model": {"type": "string", "description": "The MiniZinc model to solve"},
                    "timeout": {"type": "number", "description": "Timeout in seconds"}
                },
                "required": ["model"]
            }
        }),
        json!({
            "name": "get_instances",
            "description": "Get AWS EC2 instance types and pricing",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "region": {"type": "string", "description": "AWS region"},
                    "instance_family": {
                        "type": "string",
                        "description": "Instance family filter (e.g., m5, c5)"
                    }
                }
            }
        }),
    ]
}

/// Answer one JSON-RPC message. Notifications and client responses get no
/// reply.
pub fn handle_rpc(message: &Value) -> Option<Value> {
    let method = message.get("method").and_then(Value::as_str)?;
    let id = message.get("id").cloned().filter(|id| !id.is_null())?;
    let params = message.get("params").cloned().unwrap_or(Value::Null);
    debug!(method, "Mock MCP request");

    let result = match method {
        "initialize" => json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "advisor-mock-tools", "version": env!("CARGO_PKG_VERSION")}
        }),
        "ping" => json!({}),
        "tools/list" => json!({"tools": mock_tools()}),
        "tools/call" => call_tool(&params),
        other => {
            return Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": METHOD_NOT_FOUND, "message": format!("Method not found: {other}")}
            }));
        }
    };
    Some(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

fn call_tool(params: &Value) -> Value {
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    debug!(tool = name, arguments = %params.get("arguments").unwrap_or(&serde_json::Value::Null), "Mock tool call");

    let output = match name {
        "solve_constraint" => json!({
            "status": "OPTIMAL_SOLUTION",
            "solution": {"objective": 42, "variables": {"x": 1, "y": 2, "z": 3}},
            "statistics": {"solveTime": "0.5s", "nodes": 100}
        }),
        "get_instances" => json!({
            "instances": [
                {"type": "m5.large", "vcpu": 2, "memory": 8, "price_per_hour": 0.096},
                {"type": "m5.xlarge", "vcpu": 4, "memory": 16, "price_per_hour": 0.192},
                {"type": "c5.large", "vcpu": 2, "memory": 4, "price_per_hour": 0.085}
            ]
        }),
        other => json!({"message": format!("Unknown tool: {other}")}),
    };
    let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
    json!({"content": [{"type": "text", "text": text}]})
}

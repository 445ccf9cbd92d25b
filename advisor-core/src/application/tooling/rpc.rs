//! JSON-RPC request/response correlation shared by the SSE and stdio
//! transports.

use super::error::ToolInvokeError;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

type Responder = oneshot::Sender<Result<Value, ToolInvokeError>>;

pub(super) struct RpcChannel {
    server: String,
    pending: Mutex<HashMap<String, Responder>>,
    id_counter: AtomicU64,
}

/// What an inbound message turned out to be after correlation.
#[derive(Debug, PartialEq)]
pub(super) enum Inbound {
    Response,
    ServerRequest { id: Value, method: String },
    Notification { method: String },
    Ignored,
}

/// A request written (or about to be written) to the wire. Dropping it before
/// the response arrives forgets the request id.
pub(super) struct PendingResponse {
    id: String,
    rx: oneshot::Receiver<Result<Value, ToolInvokeError>>,
    channel: Arc<RpcChannel>,
}

impl RpcChannel {
    pub(super) fn new(server: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            server: server.into(),
            pending: Mutex::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
        })
    }

    pub(super) fn server(&self) -> &str {
        &self.server
    }

    /// Allocate an id, register a responder and build the request payload.
    pub(super) fn start_request(
        self: &Arc<Self>,
        method: &str,
        params: Value,
    ) -> (Value, PendingResponse) {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let key = id.to_string();
        let (tx, rx) = oneshot::channel();
        self.lock().insert(key.clone(), tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        let pending = PendingResponse {
            id: key,
            rx,
            channel: Arc::clone(self),
        };
        (payload, pending)
    }

    /// Route an inbound message: responses complete their pending request,
    /// everything else is handed back to the transport.
    pub(super) fn dispatch(&self, value: Value) -> Inbound {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);
        match (value.get("id").cloned(), method) {
            (Some(id), Some(method)) => Inbound::ServerRequest { id, method },
            (None, Some(method)) => Inbound::Notification { method },
            (Some(id), None) => {
                self.complete(&id, value);
                Inbound::Response
            }
            (None, None) => Inbound::Ignored,
        }
    }

    fn complete(&self, id: &Value, value: Value) {
        let key = match id {
            Value::String(value) => value.clone(),
            Value::Number(num) => num.to_string(),
            _ => return,
        };

        let Some(sender) = self.lock().remove(&key) else {
            debug!(
                server = %self.server,
                response_id = key,
                "received response for unknown request"
            );
            return;
        };

        let outcome = match value.get("error") {
            Some(error) => Err(ToolInvokeError::Rpc {
                server: self.server.clone(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            }),
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = sender.send(outcome);
    }

    /// Fail every outstanding request; used when the connection goes away.
    pub(super) fn fail_all(&self) {
        let drained: Vec<_> = self.lock().drain().collect();
        for (_, sender) in drained {
            let _ = sender.send(Err(ToolInvokeError::Terminated {
                server: self.server.clone(),
            }));
        }
    }

    fn forget(&self, id: &str) {
        self.lock().remove(id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Responder>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PendingResponse {
    pub(super) async fn wait(mut self) -> Result<Value, ToolInvokeError> {
        match (&mut self.rx).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.channel.server.clone(),
            }),
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.channel.forget(&self.id);
    }
}

pub(super) fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params
    })
}

/// Build the reply to a server-initiated request. Only `ping` is supported.
pub(super) fn answer_server_request(id: Value, method: &str) -> Value {
    match method {
        "ping" => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {}
        }),
        other => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": -32601,
                "message": format!("client does not implement method '{other}'"),
            }
        }),
    }
}

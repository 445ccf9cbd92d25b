// Shared helpers for the integration tests: a scripted model provider,
// in-process servers on ephemeral ports and a UI stream parser.

#![allow(dead_code)]

use advisor_core::config::AppConfig;
use advisor_core::mock;
use advisor_core::model::{
    ModelError, ModelEvent, ModelProvider, ModelRequest, ModelStream, StopReason, Usage,
};
use advisor_core::server::{self, ServerState};
use advisor_core::session::{AgentSessionManager, McpSessionBuilder};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Replays one scripted turn per model call and records every request.
pub struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<ModelEvent>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<Vec<ModelEvent>>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        self.requests.lock().expect("requests lock").push(request);
        let turn = self
            .turns
            .lock()
            .expect("turns lock")
            .pop_front()
            .unwrap_or_else(|| text_turn("Nothing left to do."));
        Ok(futures::stream::iter(turn.into_iter().map(Ok)).boxed())
    }
}

pub fn tool_turn(id: &str, name: &str, input: Value) -> Vec<ModelEvent> {
    vec![
        ModelEvent::ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input,
        },
        ModelEvent::Finish {
            reason: StopReason::ToolUse,
            usage: Usage::default(),
        },
    ]
}

pub fn text_turn(text: &str) -> Vec<ModelEvent> {
    vec![
        ModelEvent::TextDelta(text.to_string()),
        ModelEvent::Finish {
            reason: StopReason::EndTurn,
            usage: Usage::default(),
        },
    ]
}

/// Start the mock MCP server and return its address.
pub async fn spawn_mock_tools() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock tools");
    let addr = listener.local_addr().expect("mock tools addr");
    tokio::spawn(async move {
        let _ = mock::serve_listener(listener).await;
    });
    addr
}

/// Accepts connections and never writes a byte.
pub async fn spawn_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind silent server");
    let addr = listener.local_addr().expect("silent server addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    addr
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub sessions: Arc<AgentSessionManager>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Serve the chat API for `config`, with `model` standing in for the
/// configured provider.
pub async fn spawn_app(config: AppConfig, model: Arc<dyn ModelProvider>) -> TestApp {
    let builder = McpSessionBuilder::from_config(&config).with_model(model);
    let sessions = Arc::new(AgentSessionManager::new(Arc::new(builder)));
    let state = Arc::new(ServerState::from_config(Arc::clone(&sessions), &config));
    let app = server::router(state, &config.cors_origins);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind app");
    let addr = listener.local_addr().expect("app addr");
    tokio::spawn(async move {
        let _ = server::serve_listener(listener, app).await;
    });
    TestApp { addr, sessions }
}

/// Configuration with one SSE tool server per `(name, url)` pair.
pub fn config_with_sse_servers(servers: &[(&str, String)], agent: &str) -> AppConfig {
    let mut raw = format!("[agent]\n{agent}\n");
    for (name, url) in servers {
        raw.push_str(&format!("\n[[servers]]\nname = \"{name}\"\nurl = \"{url}\"\n"));
    }
    AppConfig::from_toml_str(&raw).expect("test config")
}

/// Data payloads of an SSE body, in order.
pub fn sse_data(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start().to_string())
        .collect()
}

/// The JSON events of a UI message stream, without the `[DONE]` marker.
pub fn ui_events(body: &str) -> Vec<Value> {
    sse_data(body)
        .iter()
        .filter(|data| data.as_str() != "[DONE]")
        .map(|data| serde_json::from_str(data).expect("stream event json"))
        .collect()
}

pub fn user_message(text: &str) -> Value {
    serde_json::json!({
        "messages": [
            {"id": "m1", "role": "user", "parts": [{"type": "text", "text": text}]}
        ]
    })
}

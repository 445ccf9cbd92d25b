// SSE transport tests - real MCP traffic against the in-process mock server
//
// Covers the endpoint handshake, tool discovery, tool invocation and the
// mock server's own session handling.

#[path = "../common/mod.rs"]
mod common;

use advisor_core::config::ServerConfig;
use advisor_core::tooling::{
    ConnectError, ConnectionState, SseTransport, ToolConnection, ToolTransport,
};
use serde_json::{Value, json};
use std::time::Duration;

const DEADLINE: Duration = Duration::from_secs(5);

#[tokio::test]
async fn connection_discovers_both_mock_tools() {
    let addr = common::spawn_mock_tools().await;
    let mut connection =
        ToolConnection::new(ServerConfig::sse("minizinc", format!("http://{addr}/sse")));

    let tools = connection
        .establish(DEADLINE, DEADLINE)
        .await
        .expect("mock server connects");

    assert_eq!(connection.state(), ConnectionState::Connected);
    let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    names.sort();
    assert_eq!(names, vec!["get_instances", "solve_constraint"]);
    assert!(tools.iter().all(|t| t.server() == "minizinc"));

    let solver = tools
        .iter()
        .find(|t| t.name() == "solve_constraint")
        .expect("solver tool");
    assert_eq!(solver.input_schema()["required"], json!(["model"]));
}

#[tokio::test]
async fn tool_invocation_round_trips_through_the_event_stream() {
    let addr = common::spawn_mock_tools().await;
    let mut connection =
        ToolConnection::new(ServerConfig::sse("instances", format!("http://{addr}/sse")));
    let tools = connection.establish(DEADLINE, DEADLINE).await.expect("connect");
    let catalog = tools
        .iter()
        .find(|t| t.name() == "get_instances")
        .expect("catalog tool");

    let output = catalog
        .invoke(json!({"region": "us-east-1"}))
        .await
        .expect("tool call");

    assert!(!output.is_error);
    let parsed: Value = serde_json::from_str(&output.text).expect("json text");
    assert_eq!(parsed["instances"][0]["type"], json!("m5.large"));
}

#[tokio::test]
async fn transport_exposes_session_endpoint() {
    let addr = common::spawn_mock_tools().await;
    let transport = SseTransport::connect("mock", &format!("http://{addr}/sse"))
        .await
        .expect("sse connect");

    assert_eq!(transport.server(), "mock");
    assert!(!transport.session_id().unwrap_or_default().is_empty());

    let pong = transport.request("ping", json!({})).await.expect("ping");
    assert_eq!(pong, json!({}));
}

#[tokio::test]
async fn mock_rejects_unknown_sessions_and_counts_open_streams() {
    let addr = common::spawn_mock_tools().await;
    let http = reqwest::Client::new();

    let rejected = http
        .post(format!("http://{addr}/message?sessionId=nope"))
        .body("{}")
        .send()
        .await
        .expect("post");
    assert_eq!(rejected.status().as_u16(), 400);
    let body: Value = rejected.json().await.expect("error body");
    assert_eq!(body["error"], json!("Invalid or expired session"));

    let _transport = SseTransport::connect("mock", &format!("http://{addr}/sse"))
        .await
        .expect("sse connect");
    let health: Value = http
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("health")
        .json()
        .await
        .expect("health body");
    assert_eq!(health, json!({"status": "ok", "sessions": 1}));

    let missing = http
        .get(format!("http://{addr}/nowhere"))
        .send()
        .await
        .expect("get");
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn refused_connection_error_keeps_url_path_out() {
    let closed = common::closed_port().await;
    let mut connection = ToolConnection::new(ServerConfig::sse(
        "instances",
        format!("http://{closed}/mcp/tok-4f2a9c/sse"),
    ));

    let err = connection
        .connect(DEADLINE)
        .await
        .expect_err("nothing listens on the port");

    assert!(matches!(err, ConnectError::Connection { .. }));
    assert_eq!(connection.state(), ConnectionState::Failed);

    let mut rendered = vec![err.to_string()];
    let mut cause = std::error::Error::source(&err);
    while let Some(current) = cause {
        rendered.push(current.to_string());
        cause = current.source();
    }
    assert!(
        rendered.iter().all(|text| !text.contains("tok-4f2a9c")),
        "url path leaked: {rendered:?}"
    );
    assert!(rendered[0].contains("instances"));
}

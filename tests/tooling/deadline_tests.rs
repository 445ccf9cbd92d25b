// Deadline tests - tool servers that never answer or are not there at all
//
// Session builds must fail within the configured connect deadline, report
// a timeout to the caller and leave the manager ready to retry.

#[path = "../common/mod.rs"]
mod common;

use advisor_core::config::ServerConfig;
use advisor_core::session::SessionStatus;
use advisor_core::tooling::{ConnectError, ConnectPhase, ConnectionState, ToolConnection};
use serde_json::Value;
use std::time::{Duration, Instant};

#[tokio::test]
async fn silent_server_hits_connect_deadline() {
    let addr = common::spawn_silent_server().await;
    let mut connection =
        ToolConnection::new(ServerConfig::sse("minizinc", format!("http://{addr}/sse")));

    let started = Instant::now();
    let err = connection
        .establish(Duration::from_millis(200), Duration::from_secs(5))
        .await
        .expect_err("silent server must time out");

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(
        err,
        ConnectError::Timeout {
            phase: ConnectPhase::Connect,
            ..
        }
    ));
    assert_eq!(connection.state(), ConnectionState::Failed);
}

#[tokio::test]
async fn chat_reports_gateway_timeout_and_allows_retry() {
    let silent = common::spawn_silent_server().await;
    let config = common::config_with_sse_servers(
        &[("minizinc", format!("http://{silent}/sse"))],
        "connect_timeout_ms = 300",
    );
    let app = common::spawn_app(config, common::ScriptedModel::new(vec![])).await;
    let http = reqwest::Client::new();

    let response = http
        .post(app.url("/api/chat"))
        .json(&common::user_message("pack my jobs"))
        .send()
        .await
        .expect("chat request");
    assert_eq!(response.status().as_u16(), 504);
    let body: Value = response.json().await.expect("error body");
    let message = body["error"].as_str().expect("error text");
    assert!(message.contains("minizinc"), "unexpected message: {message}");

    assert_eq!(app.sessions.status(), SessionStatus::Uninitialized);
    assert_eq!(app.sessions.builds_started(), 1);

    let retry = http
        .post(app.url("/api/chat"))
        .json(&common::user_message("pack my jobs"))
        .send()
        .await
        .expect("retry request");
    assert_eq!(retry.status().as_u16(), 504);
    assert_eq!(app.sessions.builds_started(), 2);
}

#[tokio::test]
async fn unreachable_server_is_a_bad_gateway() {
    let closed = common::closed_port().await;
    let config = common::config_with_sse_servers(
        &[("instances", format!("http://{closed}/sse"))],
        "connect_timeout_ms = 2000",
    );
    let app = common::spawn_app(config, common::ScriptedModel::new(vec![])).await;

    let response = reqwest::Client::new()
        .post(app.url("/api/chat"))
        .json(&common::user_message("hello"))
        .send()
        .await
        .expect("chat request");

    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await.expect("error body");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("instances")));
}

#[tokio::test]
async fn one_silent_server_fails_the_whole_build() {
    let mock = common::spawn_mock_tools().await;
    let silent = common::spawn_silent_server().await;
    let config = common::config_with_sse_servers(
        &[
            ("instances", format!("http://{mock}/sse")),
            ("minizinc", format!("http://{silent}/sse")),
        ],
        "connect_timeout_ms = 300",
    );
    let app = common::spawn_app(config, common::ScriptedModel::new(vec![])).await;

    let started = Instant::now();
    let err = app.sessions.acquire().await.expect_err("build must fail");

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(err.is_timeout());
    assert!(err.user_message().contains("minizinc"));
    assert!(app.sessions.ready().is_none());
}

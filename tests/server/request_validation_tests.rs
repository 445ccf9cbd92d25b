// Request validation tests - malformed chat bodies
//
// Bad input is rejected with 400 and a JSON error before any session build
// starts.

#[path = "../common/mod.rs"]
mod common;

use advisor_core::config::AppConfig;
use serde_json::{Value, json};

async fn app() -> common::TestApp {
    let config = AppConfig::from_toml_str("").expect("default config");
    common::spawn_app(config, common::ScriptedModel::new(vec![])).await
}

async fn post_raw(app: &common::TestApp, body: &str) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(app.url("/api/chat"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .expect("chat request");
    let status = response.status().as_u16();
    (status, response.json().await.expect("error body"))
}

#[tokio::test]
async fn invalid_json_is_a_bad_request() {
    let app = app().await;
    let (status, body) = post_raw(&app, "{not json").await;

    assert_eq!(status, 400);
    assert!(body["error"].as_str().is_some_and(|e| e.starts_with("Invalid request")));
    assert_eq!(app.sessions.builds_started(), 0);
}

#[tokio::test]
async fn missing_messages_field_is_a_bad_request() {
    let app = app().await;
    let (status, _) = post_raw(&app, r#"{"prompt": "hi"}"#).await;

    assert_eq!(status, 400);
    assert_eq!(app.sessions.builds_started(), 0);
}

#[tokio::test]
async fn empty_history_is_a_bad_request() {
    let app = app().await;
    let (status, body) = post_raw(&app, &json!({"messages": []}).to_string()).await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Invalid request: messages must not be empty"}));
}

#[tokio::test]
async fn unknown_role_is_a_bad_request() {
    let app = app().await;
    let body = json!({"messages": [{"role": "tool", "parts": []}]}).to_string();
    let (status, _) = post_raw(&app, &body).await;

    assert_eq!(status, 400);
}

#[tokio::test]
async fn session_without_servers_streams_plain_reply() {
    let config = AppConfig::from_toml_str("").expect("default config");
    let app = common::spawn_app(
        config,
        common::ScriptedModel::new(vec![common::text_turn("Hello! What workload should I size?")]),
    )
    .await;

    let response = reqwest::Client::new()
        .post(app.url("/api/chat"))
        .json(&common::user_message("hi"))
        .send()
        .await
        .expect("chat request");
    assert_eq!(response.status().as_u16(), 200);

    let events = common::ui_events(&response.text().await.expect("body"));
    let kinds: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "start",
            "start-step",
            "text-start",
            "text-delta",
            "text-end",
            "finish-step",
            "finish"
        ]
    );
}

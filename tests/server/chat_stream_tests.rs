// Chat stream tests - the full request path
//
// A real HTTP server, a real MCP connection to the mock tool server and a
// scripted model: the agent fetches the instance catalog, runs the solver
// and ends with a summary.

#[path = "../common/mod.rs"]
mod common;

use advisor_core::session::SessionStatus;
use serde_json::{Value, json};

const PROMPT: &str = "I need to run 10 1-core jobs, each takes 1 hour, in us-east-1, minimize cost";
const SUMMARY: &str = "I fetched the us-east-1 instance catalog, encoded the ten single-core jobs as a bin-packing model and the solver found an optimal plan on c5.large instances.";

fn events_of_type<'a>(events: &'a [Value], kind: &str) -> Vec<&'a Value> {
    events.iter().filter(|e| e["type"] == kind).collect()
}

#[tokio::test]
async fn agent_calls_catalog_then_solver_then_summarizes() {
    let mock = common::spawn_mock_tools().await;
    let config = common::config_with_sse_servers(
        &[
            ("instances", format!("http://{mock}/sse")),
            ("minizinc", format!("http://{mock}/sse")),
        ],
        "",
    );
    let model = common::ScriptedModel::new(vec![
        common::tool_turn("call-catalog", "get_instances", json!({"region": "us-east-1"})),
        common::tool_turn(
            "call-solver",
            "solve_constraint",
            json!({"model": "int: jobs = 10; solve minimize cost;", "timeout": 30}),
        ),
        common::text_turn(SUMMARY),
    ]);
    let app = common::spawn_app(config, model.clone()).await;

    let response = reqwest::Client::new()
        .post(app.url("/api/chat"))
        .json(&common::user_message(PROMPT))
        .send()
        .await
        .expect("chat request");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["x-vercel-ai-ui-message-stream"],
        "v1"
    );
    assert!(
        response.headers()["content-type"]
            .to_str()
            .expect("content type")
            .starts_with("text/event-stream")
    );

    let body = response.text().await.expect("stream body");
    assert_eq!(common::sse_data(&body).last().map(String::as_str), Some("[DONE]"));
    let events = common::ui_events(&body);
    assert_eq!(events.first().map(|e| &e["type"]), Some(&json!("start")));

    let calls: Vec<&str> = events_of_type(&events, "tool-input-available")
        .iter()
        .filter_map(|e| e["toolName"].as_str())
        .collect();
    assert_eq!(calls, vec!["get_instances", "solve_constraint"]);

    let outputs = events_of_type(&events, "tool-output-available");
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[1]["toolCallId"], json!("call-solver"));
    assert!(
        outputs[1]["output"]
            .as_str()
            .is_some_and(|text| text.contains("OPTIMAL_SOLUTION"))
    );

    let text: String = events_of_type(&events, "text-delta")
        .iter()
        .filter_map(|e| e["delta"].as_str())
        .collect();
    assert_eq!(text, SUMMARY);
    assert_eq!(events.last(), Some(&json!({"type": "finish", "finishReason": "stop"})));
    assert_eq!(events_of_type(&events, "start-step").len(), 3);

    let requests = model.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].tools.len(), 2);
    assert_eq!(requests[0].thinking_budget, Some(12_000));
    assert!(
        requests[0]
            .system
            .as_deref()
            .is_some_and(|system| system.contains("MiniZinc"))
    );
    let fed_back = serde_json::to_string(&requests[2].messages).expect("messages json");
    assert!(fed_back.contains("OPTIMAL_SOLUTION"));
    assert!(fed_back.contains("m5.large"));
}

#[tokio::test]
async fn concurrent_first_requests_share_one_session_build() {
    let mock = common::spawn_mock_tools().await;
    let config =
        common::config_with_sse_servers(&[("instances", format!("http://{mock}/sse"))], "");
    let app = common::spawn_app(config, common::ScriptedModel::new(vec![])).await;
    let http = reqwest::Client::new();

    let health: Value = http
        .get(app.url("/health"))
        .send()
        .await
        .expect("health")
        .json()
        .await
        .expect("health body");
    assert_eq!(health["session"], json!("uninitialized"));

    let requests = (0..8).map(|i| {
        let http = http.clone();
        let url = app.url("/api/chat");
        async move {
            http.post(url)
                .json(&common::user_message(&format!("request {i}")))
                .send()
                .await
                .expect("chat request")
                .status()
                .as_u16()
        }
    });
    let statuses = futures::future::join_all(requests).await;

    assert!(statuses.iter().all(|status| *status == 200));
    assert_eq!(app.sessions.builds_started(), 1);
    assert_eq!(app.sessions.status(), SessionStatus::Ready);

    let health: Value = http
        .get(app.url("/health"))
        .send()
        .await
        .expect("health")
        .json()
        .await
        .expect("health body");
    assert_eq!(health["session"], json!("ready"));
    assert_eq!(health["builds_started"], json!(1));
}

#[tokio::test]
async fn tool_inventory_lists_merged_namespace() {
    let mock = common::spawn_mock_tools().await;
    let config = common::config_with_sse_servers(
        &[
            ("first", format!("http://{mock}/sse")),
            ("second", format!("http://{mock}/sse")),
        ],
        "",
    );
    let app = common::spawn_app(config, common::ScriptedModel::new(vec![])).await;

    let inventory: Value = reqwest::Client::new()
        .get(app.url("/api/tools"))
        .send()
        .await
        .expect("tools request")
        .json()
        .await
        .expect("inventory body");

    let tools = inventory["tools"].as_array().expect("tools");
    assert_eq!(tools.len(), 2);
    assert!(tools.iter().all(|tool| tool["server"] == "second"));
    assert_eq!(inventory["collisions"].as_array().map(Vec::len), Some(2));
}

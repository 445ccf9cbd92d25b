// Download tests - static configuration files served as attachments

#[path = "../common/mod.rs"]
mod common;

use advisor_core::config::AppConfig;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

async fn app_with_download(dir: &TempDir, create_file: bool) -> common::TestApp {
    let path = dir.path().join("bocce-calendar.mobileconfig");
    if create_file {
        fs::write(&path, "<?xml version=\"1.0\"?><plist/>").expect("write profile");
    }
    let raw = format!(
        "[[downloads]]\nname = \"install-calendar\"\npath = '{}'\ncontent_type = \"application/x-apple-aspen-config\"\n",
        path.display()
    );
    let config = AppConfig::from_toml_str(&raw).expect("config");
    common::spawn_app(config, common::ScriptedModel::new(vec![])).await
}

#[tokio::test]
async fn serves_configured_file_as_attachment() {
    let dir = TempDir::new().expect("tempdir");
    let app = app_with_download(&dir, true).await;

    let response = reqwest::get(app.url("/api/downloads/install-calendar"))
        .await
        .expect("download");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/x-apple-aspen-config"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"bocce-calendar.mobileconfig\""
    );
    assert_eq!(
        response.text().await.expect("body"),
        "<?xml version=\"1.0\"?><plist/>"
    );
    assert_eq!(app.sessions.builds_started(), 0);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let app = app_with_download(&dir, false).await;

    let response = reqwest::get(app.url("/api/downloads/install-calendar"))
        .await
        .expect("download");

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body, json!({"error": "Configuration file not found"}));
}

#[tokio::test]
async fn unknown_download_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let app = app_with_download(&dir, true).await;

    let response = reqwest::get(app.url("/api/downloads/other"))
        .await
        .expect("download");

    assert_eq!(response.status().as_u16(), 404);
}

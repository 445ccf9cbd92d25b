// Config file tests - the shipped advisor.toml must stay loadable

use advisor_core::config::{AppConfig, ConfigError, ServerTransport};
use std::path::PathBuf;
use std::time::Duration;

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("config")
        .join("advisor.toml")
}

#[test]
fn shipped_config_loads_with_expected_defaults() {
    unsafe {
        std::env::set_var("INSTANCES_MCP_URL", "http://127.0.0.1:3001/sse");
    }
    let config = AppConfig::load(Some(&shipped_config())).expect("shipped config loads");

    assert_eq!(config.agent.max_steps, 1000);
    assert_eq!(config.agent.connect_timeout, Duration::from_secs(30));
    assert_eq!(config.agent.discovery_timeout, Duration::from_secs(10));
    assert_eq!(config.provider.thinking_budget, Some(12_000));
    assert_eq!(config.provider.api_key.as_deref(), Some("ANTHROPIC_API_KEY"));

    let names: Vec<&str> = config.servers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["minizinc", "instances"]);
    assert!(
        config
            .servers
            .iter()
            .all(|s| matches!(s.transport, ServerTransport::Sse { .. }))
    );
    assert!(config.download("install-calendar").is_some());
}

#[test]
fn missing_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("advisor.toml");

    let err = AppConfig::load(Some(&path)).expect_err("missing file");
    assert!(matches!(err, ConfigError::NotFound { path: reported } if reported == path));
}

#[test]
fn sse_server_without_url_is_rejected() {
    let err = AppConfig::from_toml_str("[[servers]]\nname = \"minizinc\"\ntransport = \"sse\"\n")
        .expect_err("url required");
    assert!(matches!(err, ConfigError::MissingUrl { server } if server == "minizinc"));
}

#[test]
fn unset_url_variable_fails_at_load_time() {
    let toml = "[[servers]]\nname = \"instances\"\nurl = \"${ADVISOR_TEST_MISSING_URL}\"\n";
    let err = AppConfig::from_toml_str(toml).expect_err("unset variable");
    assert!(matches!(
        err,
        ConfigError::UnsetVariable { server, var }
            if server == "instances" && var == "ADVISOR_TEST_MISSING_URL"
    ));
}

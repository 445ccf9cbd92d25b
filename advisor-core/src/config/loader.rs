use super::agent::RawAgentSettings;
use super::download::DownloadConfig;
use super::error::ConfigError;
use super::provider::{ModelProviderConfig, RawProviderConfig};
use super::server::{RawServer, ServerConfig};
use crate::constants::{CONFIG_PATH, DEFAULT_BIND, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub bind: Option<String>,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub agent: RawAgentSettings,
    #[serde(default)]
    pub provider: RawProviderConfig,
    #[serde(default)]
    pub servers: Vec<RawServer>,
    #[serde(default)]
    pub downloads: Vec<DownloadConfig>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<super::AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    debug!(path = %config_path.display(), "Reading advisor configuration file");

    let content = fs::read_to_string(config_path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: config_path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content)
}

pub(super) fn parse_config(content: &str) -> Result<super::AppConfig, ConfigError> {
    let parsed: RawConfig =
        toml::from_str(content).map_err(|source| ConfigError::Parse { source })?;
    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<super::AppConfig, ConfigError> {
    let bind_raw = parsed.bind.unwrap_or_else(|| DEFAULT_BIND.to_string());
    let bind: SocketAddr = bind_raw
        .parse()
        .map_err(|_| ConfigError::InvalidBind { value: bind_raw })?;

    let agent = super::AgentSettings::from(parsed.agent);
    if agent.max_steps == 0 {
        return Err(ConfigError::ZeroSteps);
    }

    let provider = ModelProviderConfig::from(parsed.provider);
    if provider.model.trim().is_empty() {
        return Err(ConfigError::MissingModel);
    }
    if let Some(budget) = provider.thinking_budget {
        if budget >= provider.max_tokens {
            return Err(ConfigError::ThinkingBudgetTooLarge {
                budget,
                max_tokens: provider.max_tokens,
            });
        }
    }

    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(parsed.servers.len());
    for raw in parsed.servers {
        let server = ServerConfig::try_from(raw)?;
        if !seen.insert(server.name.clone()) {
            return Err(ConfigError::DuplicateServer {
                server: server.name,
            });
        }
        servers.push(server);
    }

    let mut names = HashSet::new();
    for download in &parsed.downloads {
        if !names.insert(download.name.as_str()) {
            return Err(ConfigError::DuplicateDownload {
                name: download.name.clone(),
            });
        }
    }

    Ok(super::AppConfig {
        bind,
        cors_origins: parsed.cors_origins,
        agent,
        provider,
        servers,
        downloads: parsed.downloads,
    })
}

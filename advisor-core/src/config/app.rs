use super::agent::AgentSettings;
use super::download::DownloadConfig;
use super::error::ConfigError;
use super::provider::ModelProviderConfig;
use super::server::ServerConfig;
use std::net::SocketAddr;
use std::path::Path;

/// Application configuration loaded from advisor.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub cors_origins: Vec<String>,
    pub agent: AgentSettings,
    pub provider: ModelProviderConfig,
    pub servers: Vec<ServerConfig>,
    pub downloads: Vec<DownloadConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Parse configuration from TOML text without touching the filesystem
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        super::loader::parse_config(content)
    }

    pub fn download(&self, name: &str) -> Option<&DownloadConfig> {
        self.downloads.iter().find(|d| d.name == name)
    }
}

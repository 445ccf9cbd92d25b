pub mod agent;
pub mod app;
pub mod download;
pub mod error;
pub mod loader;
pub mod provider;
pub mod server;

pub use crate::constants::CONFIG_PATH;

pub use agent::AgentSettings;
pub use app::AppConfig;
pub use download::DownloadConfig;
pub use error::ConfigError;
pub use provider::ModelProviderConfig;
pub use server::{ServerConfig, ServerTransport};

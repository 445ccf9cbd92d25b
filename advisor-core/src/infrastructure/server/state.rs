use crate::application::session::AgentSessionManager;
use crate::config::{AppConfig, DownloadConfig};
use std::sync::Arc;

/// Shared by every handler. The session manager is the only process-wide
/// mutable state.
pub struct ServerState {
    sessions: Arc<AgentSessionManager>,
    downloads: Vec<DownloadConfig>,
}

impl ServerState {
    pub fn new(sessions: Arc<AgentSessionManager>, downloads: Vec<DownloadConfig>) -> Self {
        Self {
            sessions,
            downloads,
        }
    }

    pub fn from_config(sessions: Arc<AgentSessionManager>, config: &AppConfig) -> Self {
        Self::new(sessions, config.downloads.clone())
    }

    pub fn sessions(&self) -> &Arc<AgentSessionManager> {
        &self.sessions
    }

    pub fn download(&self, name: &str) -> Option<&DownloadConfig> {
        self.downloads.iter().find(|d| d.name == name)
    }
}

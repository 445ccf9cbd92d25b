use crate::application::tooling::ConnectError;
use crate::infrastructure::model::ModelError;
use std::sync::Arc;
use thiserror::Error;

/// Why a session build was abandoned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Tooling(#[from] ConnectError),
    #[error("failed to create model provider: {0}")]
    Model(#[from] ModelError),
    #[error("session build task ended abnormally: {0}")]
    Aborted(String),
}

impl BuildError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BuildError::Tooling(err) if err.is_timeout())
    }

    pub fn user_message(&self) -> String {
        match self {
            BuildError::Tooling(err) if err.is_timeout() => format!(
                "Tool server '{}' did not respond in time. Please try again.",
                err.server()
            ),
            BuildError::Tooling(err) => format!(
                "Could not connect to tool server '{}'. Please try again.",
                err.server()
            ),
            BuildError::Model(err) => err.user_message(),
            BuildError::Aborted(_) => "The agent could not be initialized.".to_string(),
        }
    }
}

/// Returned by [`acquire`](super::AgentSessionManager::acquire); the same
/// build error is shared by every caller that waited on the failed build.
#[derive(Debug, Clone, Error)]
#[error("agent session unavailable: {source}")]
pub struct SessionError {
    #[source]
    source: Arc<BuildError>,
}

impl SessionError {
    pub fn build_error(&self) -> &Arc<BuildError> {
        &self.source
    }

    pub fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }

    pub fn user_message(&self) -> String {
        self.source.user_message()
    }
}

impl From<Arc<BuildError>> for SessionError {
    fn from(source: Arc<BuildError>) -> Self {
        Self { source }
    }
}

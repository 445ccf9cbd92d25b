use crate::application::deadline::DeadlineExceeded;
use crate::application::tooling::ToolInvokeError;
use crate::infrastructure::model::ModelError;
use thiserror::Error;

/// Failure of a ready session's model loop. Ends the affected stream only.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model stream ended without a finish event")]
    Incomplete,
}

impl StreamError {
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Model(err) => err.user_message(),
            StreamError::Incomplete => {
                "The model response ended unexpectedly. Please try again.".to_string()
            }
        }
    }
}

/// Failure of one tool call inside the loop. Reported back to the model as
/// an error result; the loop keeps going.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{0}' is not available")]
    UnknownTool(String),
    #[error("tool '{tool}' failed: {source}")]
    Invoke {
        tool: String,
        #[source]
        source: ToolInvokeError,
    },
    #[error("tool '{tool}' timed out: {source}")]
    Timeout {
        tool: String,
        #[source]
        source: DeadlineExceeded,
    },
    #[error("{message}")]
    Reported { tool: String, message: String },
}

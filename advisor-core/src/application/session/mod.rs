//! Agent session lifecycle.
//!
//! [`AgentSessionManager`] builds one [`AgentSession`] lazily, lets every
//! concurrent caller share the in-flight build, caches the result for the
//! life of the process and goes back to `Uninitialized` when a build fails.

mod builder;
mod errors;
mod manager;


pub use builder::McpSessionBuilder;
pub use errors::{BuildError, SessionError};
pub use manager::{AgentSessionManager, SessionStatus};

use crate::application::namespace::ToolNamespace;
use crate::constants::{DEFAULT_MAX_STEPS, DEFAULT_MAX_TOKENS, DEFAULT_TOOL_TIMEOUT_MS};
use crate::infrastructure::model::ModelProvider;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Builds a session from scratch. Injected into the manager so the state
/// machine can be exercised without real tool servers.
#[async_trait]
pub trait SessionBuilder: Send + Sync + 'static {
    async fn build(&self) -> Result<AgentSession, BuildError>;
}

/// A ready agent: model, finalized tool namespace, instruction and limits.
/// Immutable once built.
pub struct AgentSession {
    model: Arc<dyn ModelProvider>,
    model_id: String,
    namespace: ToolNamespace,
    instructions: String,
    max_steps: usize,
    max_tokens: u32,
    thinking_budget: Option<u32>,
    tool_timeout: Option<Duration>,
}

impl AgentSession {
    pub fn new(
        model: Arc<dyn ModelProvider>,
        model_id: impl Into<String>,
        namespace: ToolNamespace,
    ) -> Self {
        Self {
            model,
            model_id: model_id.into(),
            namespace,
            instructions: String::new(),
            max_steps: DEFAULT_MAX_STEPS,
            max_tokens: DEFAULT_MAX_TOKENS,
            thinking_budget: None,
            tool_timeout: Some(Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS)),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_thinking_budget(mut self, budget: Option<u32>) -> Self {
        self.thinking_budget = budget;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn model(&self) -> &Arc<dyn ModelProvider> {
        &self.model
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn namespace(&self) -> &ToolNamespace {
        &self.namespace
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn thinking_budget(&self) -> Option<u32> {
        self.thinking_budget
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout
    }
}

impl fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSession")
            .field("provider", &self.model.id())
            .field("model", &self.model_id)
            .field("tools", &self.namespace.names())
            .field("max_steps", &self.max_steps)
            .field("thinking_budget", &self.thinking_budget)
            .field("tool_timeout", &self.tool_timeout)
            .finish()
    }
}

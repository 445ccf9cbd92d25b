use super::errors::BuildError;
use super::{AgentSession, SessionBuilder};
use crate::application::namespace::ToolNamespace;
use crate::application::tooling::{ConnectError, ToolConnection};
use crate::config::{AgentSettings, AppConfig, ModelProviderConfig, ServerConfig};
use crate::infrastructure::model::{ModelProvider, ProviderFactory};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Builds sessions from configuration: connects every declared tool server,
/// merges their tools in declaration order and creates the model provider.
pub struct McpSessionBuilder {
    servers: Vec<ServerConfig>,
    agent: AgentSettings,
    provider: ModelProviderConfig,
    model: Option<Arc<dyn ModelProvider>>,
}

impl McpSessionBuilder {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            servers: config.servers.clone(),
            agent: config.agent.clone(),
            provider: config.provider.clone(),
            model: None,
        }
    }

    /// Use the given provider instead of creating one from `[provider]`.
    pub fn with_model(mut self, model: Arc<dyn ModelProvider>) -> Self {
        self.model = Some(model);
        self
    }

    fn model(&self) -> Result<Arc<dyn ModelProvider>, BuildError> {
        match &self.model {
            Some(model) => Ok(Arc::clone(model)),
            None => Ok(ProviderFactory::create(&self.provider)?),
        }
    }

    /// Connect all servers concurrently. Results keep declaration order and
    /// the first failure drops (and so cancels) the remaining attempts.
    async fn connect_all(&self) -> Result<Vec<ToolConnection>, ConnectError> {
        let connect_timeout = self.agent.connect_timeout;
        let discovery_timeout = self.agent.discovery_timeout;
        let attempts = self.servers.iter().cloned().map(|server| async move {
            let mut connection = ToolConnection::new(server);
            connection
                .establish(connect_timeout, discovery_timeout)
                .await?;
            Ok::<_, ConnectError>(connection)
        });
        try_join_all(attempts).await
    }
}

/// The configured instruction followed by whatever instructions the tool
/// servers sent during the handshake.
fn compose_instructions(base: &str, connections: &[ToolConnection]) -> String {
    let mut instructions = base.trim_end().to_string();
    for connection in connections {
        if let Some(extra) = connection.instructions().filter(|s| !s.trim().is_empty()) {
            instructions.push_str("\n\n## ");
            instructions.push_str(connection.name());
            instructions.push('\n');
            instructions.push_str(extra.trim());
        }
    }
    instructions
}

#[async_trait]
impl SessionBuilder for McpSessionBuilder {
    async fn build(&self) -> Result<AgentSession, BuildError> {
        let started = Instant::now();
        let model = self.model()?;
        debug!(
            provider = model.id(),
            servers = self.servers.len(),
            "Connecting tool servers"
        );

        let connections = self.connect_all().await?;
        let namespace =
            ToolNamespace::merge(connections.iter().map(|c| c.tools().to_vec()));
        let instructions = compose_instructions(&self.agent.system_prompt, &connections);

        info!(
            servers = connections.len(),
            tools = namespace.len(),
            collisions = namespace.collisions().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool namespace assembled"
        );

        Ok(AgentSession::new(model, self.provider.model.clone(), namespace)
            .with_instructions(instructions)
            .with_max_steps(self.agent.max_steps)
            .with_max_tokens(self.provider.max_tokens)
            .with_thinking_budget(self.provider.thinking_budget)
            .with_tool_timeout(self.agent.tool_timeout))
    }
}

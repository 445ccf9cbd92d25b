use super::descriptor::ToolDescriptor;
use super::error::{ConnectError, ConnectPhase, ToolInvokeError};
use super::interface::ToolTransport;
use super::process::StdioTransport;
use super::protocol::McpPeer;
use super::sse::SseTransport;
use crate::application::deadline::with_deadline;
use crate::config::{ServerConfig, ServerTransport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connecting,
    Connected,
    Failed,
}

/// Open the transport a server entry describes.
pub async fn open_transport(
    config: &ServerConfig,
) -> Result<Arc<dyn ToolTransport>, ToolInvokeError> {
    match &config.transport {
        ServerTransport::Sse { url } => {
            let transport = SseTransport::connect(&config.name, url).await?;
            Ok(Arc::new(transport))
        }
        ServerTransport::Stdio {
            command,
            args,
            env,
            workdir,
        } => {
            let transport =
                StdioTransport::spawn(&config.name, command, args, env, workdir.as_ref()).await?;
            Ok(Arc::new(transport))
        }
    }
}

/// One tool endpoint. Owned by whoever builds the session; the descriptors
/// it discovers keep the transport alive after the connection itself is
/// dropped.
pub struct ToolConnection {
    config: ServerConfig,
    state: ConnectionState,
    peer: Option<McpPeer>,
    tools: Vec<ToolDescriptor>,
}

impl ToolConnection {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Unconnected,
            peer: None,
            tools: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn instructions(&self) -> Option<&str> {
        self.peer.as_ref().and_then(McpPeer::instructions)
    }

    /// Tools discovered so far; empty unless connected.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Open the transport and run the MCP handshake within `deadline`.
    pub async fn connect(&mut self, deadline: Duration) -> Result<(), ConnectError> {
        let config = self.config.clone();
        self.connect_with(deadline, move || async move { open_transport(&config).await })
            .await
    }

    /// Like [`connect`](Self::connect) with a caller-supplied transport
    /// opener.
    pub async fn connect_with<F, Fut>(
        &mut self,
        deadline: Duration,
        open: F,
    ) -> Result<(), ConnectError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Arc<dyn ToolTransport>, ToolInvokeError>>,
    {
        self.state = ConnectionState::Connecting;
        self.peer = None;
        self.tools.clear();
        let started = Instant::now();

        let handshake = async {
            let transport = open().await?;
            McpPeer::initialize(transport).await
        };
        let failure = format!(
            "connecting to '{}' did not complete in time",
            self.config.name
        );
        let outcome = match with_deadline(handshake, deadline, failure).await {
            Ok(Ok(peer)) => Ok(peer),
            Ok(Err(source)) => Err(ConnectError::Connection {
                server: self.config.name.clone(),
                source,
            }),
            Err(source) => Err(ConnectError::Timeout {
                server: self.config.name.clone(),
                phase: ConnectPhase::Connect,
                source,
            }),
        };

        match outcome {
            Ok(peer) => {
                info!(
                    server = %self.config.name,
                    transport = self.config.kind(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool server connected"
                );
                self.peer = Some(peer);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(err) => {
                warn!(server = %self.config.name, %err, "Tool server connection failed");
                self.state = ConnectionState::Failed;
                Err(err)
            }
        }
    }

    /// List the server's tools within `deadline`. A failure abandons the
    /// connection: it keeps no tools and its transport is released.
    pub async fn discover_tools(
        &mut self,
        deadline: Duration,
    ) -> Result<Vec<ToolDescriptor>, ConnectError> {
        let Some(peer) = self.peer.clone() else {
            return Err(ConnectError::NotConnected {
                server: self.config.name.clone(),
            });
        };
        let started = Instant::now();
        let failure = format!(
            "listing tools of '{}' did not complete in time",
            self.config.name
        );

        let outcome = match with_deadline(peer.list_tools(), deadline, failure).await {
            Ok(Ok(tools)) => Ok(tools),
            Ok(Err(source)) => Err(ConnectError::Discovery {
                server: self.config.name.clone(),
                source,
            }),
            Err(source) => Err(ConnectError::Timeout {
                server: self.config.name.clone(),
                phase: ConnectPhase::Discover,
                source,
            }),
        };

        match outcome {
            Ok(remote) => {
                let transport = peer.transport();
                let tools: Vec<_> = remote
                    .into_iter()
                    .map(|tool| ToolDescriptor::from_remote(tool, &transport))
                    .collect();
                info!(
                    server = %self.config.name,
                    tools = tools.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool discovery complete"
                );
                self.tools = tools.clone();
                Ok(tools)
            }
            Err(err) => {
                warn!(server = %self.config.name, %err, "Tool discovery failed");
                self.state = ConnectionState::Failed;
                self.peer = None;
                self.tools.clear();
                Err(err)
            }
        }
    }

    /// Connect and discover, each step under its own deadline.
    pub async fn establish(
        &mut self,
        connect_deadline: Duration,
        discovery_deadline: Duration,
    ) -> Result<Vec<ToolDescriptor>, ConnectError> {
        self.connect(connect_deadline).await?;
        self.discover_tools(discovery_deadline).await
    }
}

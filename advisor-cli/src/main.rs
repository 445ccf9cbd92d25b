mod cli;

use advisor_core::config::{AppConfig, ConfigError};
use advisor_core::mock;
use advisor_core::server::{self, ServerError, ServerState};
use advisor_core::session::{AgentSessionManager, McpSessionBuilder};
use advisor_core::tooling::ToolConnection;
use clap::Parser;
use cli::{Cli, Command};
use serde_json::json;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("{failed} of {total} tool servers could not be reached")]
    ProbeFailed { failed: usize, total: usize },
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    debug!(command = ?cli.command(), config = ?cli.config, "CLI arguments parsed");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "advisor exited with an error");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command() {
        Command::MockTools { host, port } => {
            mock::serve(SocketAddr::new(host, port)).await?;
        }
        Command::Serve { bind } => {
            let config = load_config(&cli)?;
            serve(config, bind).await?;
        }
        Command::Probe => {
            let config = load_config(&cli)?;
            probe(&config).await?;
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig, CliError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    info!(
        servers = config.servers.len(),
        downloads = config.downloads.len(),
        provider = config.provider.provider_type.as_str(),
        model = config.provider.model.as_str(),
        "Configuration loaded"
    );
    Ok(config)
}

async fn serve(config: AppConfig, bind: Option<SocketAddr>) -> Result<(), CliError> {
    let addr = bind.unwrap_or(config.bind);
    let builder = McpSessionBuilder::from_config(&config);
    let sessions = Arc::new(AgentSessionManager::new(Arc::new(builder)));
    let state = Arc::new(ServerState::from_config(sessions, &config));

    info!(%addr, "Starting chat server; the agent session is built on the first request");
    server::serve(state, addr, &config.cors_origins).await?;
    Ok(())
}

/// Each server is tried on its own so one failure does not hide the rest.
async fn probe(config: &AppConfig) -> Result<(), CliError> {
    if config.servers.is_empty() {
        warn!("No tool servers configured");
    }

    let mut failed = 0;
    for server in &config.servers {
        let started = Instant::now();
        let mut connection = ToolConnection::new(server.clone());
        let outcome = connection
            .establish(config.agent.connect_timeout, config.agent.discovery_timeout)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let report = match outcome {
            Ok(tools) => json!({
                "server": server.name,
                "status": "connected",
                "elapsed_ms": elapsed_ms,
                "tools": tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            }),
            Err(err) => {
                failed += 1;
                json!({
                    "server": server.name,
                    "status": if err.is_timeout() { "timeout" } else { "failed" },
                    "elapsed_ms": elapsed_ms,
                    "error": err.to_string(),
                })
            }
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if failed > 0 {
        return Err(CliError::ProbeFailed {
            failed,
            total: config.servers.len(),
        });
    }
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

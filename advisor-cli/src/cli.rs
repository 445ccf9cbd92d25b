use clap::{Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "advisor",
    version,
    about = "Chat server for the workload provisioning agent"
)]
pub struct Cli {
    /// Path to advisor.toml (defaults to config/advisor.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the chat API (the default)
    Serve {
        /// Overrides `bind` from the configuration file
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Connect to every configured tool server and report its tools
    Probe,
    /// Run the local mock MCP server
    MockTools {
        #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
        host: IpAddr,
        #[arg(long, default_value_t = 3001)]
        port: u16,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve { bind: None })
    }
}

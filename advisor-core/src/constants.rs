//! Application constants
//!
//! Single source of truth for paths, protocol versions and defaults.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/advisor.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// MCP protocol revision sent during the handshake
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

pub const DEFAULT_MAX_STEPS: usize = 1000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_PROVIDER_TYPE: &str = "anthropic";
pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_MAX_TOKENS: u32 = 16_000;
pub const DEFAULT_THINKING_BUDGET: u32 = 12_000;

/// Header announcing the UI message stream protocol to chat front-ends
pub const UI_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";
pub const UI_STREAM_VERSION: &str = "v1";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AWS workload provisioning assistant that helps users cost-optimize their AWS infrastructure. Your role is to:

1. Understand the user's workload requirements (CPU, memory, storage, network needs, etc.)
2. Ask clarifying questions if any critical information is missing
3. Use the instances MCP tool to get available AWS instance types and their specifications
4. Use MiniZinc constraint solver (CSP) to bin-pack the workload across available instance types for optimal cost efficiency
5. Always use a 30-second timeout when calling MiniZinc
6. Present recommendations with cost breakdowns and justification

When you complete a task, write a short paragraph summarizing what you did and how you solved the optimization problem.";

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid bind address '{value}'")]
    InvalidBind { value: String },

    #[error("server entry is missing a name")]
    MissingServerName,

    #[error("server '{server}' is declared more than once")]
    DuplicateServer { server: String },

    #[error("server '{server}' uses unknown transport '{transport}' (expected 'sse' or 'stdio')")]
    UnknownTransport { server: String, transport: String },

    #[error("server '{server}' uses the sse transport but has no 'url'")]
    MissingUrl { server: String },

    #[error("server '{server}' uses the stdio transport but has no 'command'")]
    MissingCommand { server: String },

    #[error("server '{server}' references environment variable '{var}', which is not set")]
    UnsetVariable { server: String, var: String },

    #[error("provider model must not be empty")]
    MissingModel,

    #[error("thinking budget {budget} must be lower than max_tokens {max_tokens}")]
    ThinkingBudgetTooLarge { budget: u32, max_tokens: u32 },

    #[error("agent max_steps must be at least 1")]
    ZeroSteps,

    #[error("download '{name}' is declared more than once")]
    DuplicateDownload { name: String },
}

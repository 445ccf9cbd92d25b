use super::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// One MCP tool server. Declaration order in the config file is the order in
/// which tool sets are merged into the namespace.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub transport: ServerTransport,
}

#[derive(Clone, PartialEq, Eq)]
pub enum ServerTransport {
    /// HTTP endpoint speaking MCP over server-sent events.
    Sse { url: String },
    /// Local subprocess speaking newline-delimited JSON-RPC over stdio.
    Stdio {
        command: PathBuf,
        args: Vec<String>,
        env: HashMap<String, String>,
        workdir: Option<PathBuf>,
    },
}

impl ServerConfig {
    pub fn sse(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: ServerTransport::Sse { url: url.into() },
        }
    }

    pub fn stdio(name: impl Into<String>, command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            transport: ServerTransport::Stdio {
                command: command.into(),
                args,
                env: HashMap::new(),
                workdir: None,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.transport {
            ServerTransport::Sse { .. } => "sse",
            ServerTransport::Stdio { .. } => "stdio",
        }
    }
}

// Env values and url paths routinely hold credentials, so only env keys and
// the url host are printed.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("ServerConfig");
        out.field("name", &self.name);
        match &self.transport {
            ServerTransport::Sse { url } => out.field(
                "url_host",
                &reqwest::Url::parse(url)
                    .ok()
                    .and_then(|parsed| parsed.host_str().map(str::to_string)),
            ),
            ServerTransport::Stdio {
                command,
                args,
                env,
                workdir,
            } => out
                .field("command", command)
                .field("args", args)
                .field("env_keys", &env.keys().collect::<Vec<_>>())
                .field("workdir", workdir),
        };
        out.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    #[serde(default)]
    name: String,
    #[serde(default)]
    transport: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    workdir: Option<String>,
}

fn expand(server: &str, s: &str) -> Result<String, ConfigError> {
    shellexpand::full(s)
        .map(|cow| cow.into_owned())
        .map_err(|err| ConfigError::UnsetVariable {
            server: server.to_string(),
            var: err.var_name,
        })
}

impl TryFrom<RawServer> for ServerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawServer) -> Result<Self, Self::Error> {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::MissingServerName);
        }

        // A bare `url` implies sse, a bare `command` implies stdio.
        let transport = match raw.transport.as_deref() {
            Some(kind) => kind.to_ascii_lowercase(),
            None if raw.command.is_some() => "stdio".to_string(),
            None => "sse".to_string(),
        };

        let transport = match transport.as_str() {
            "sse" => {
                let url = raw
                    .url
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingUrl {
                        server: name.clone(),
                    })?;
                ServerTransport::Sse {
                    url: expand(&name, &url)?,
                }
            }
            "stdio" => {
                let command = raw
                    .command
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingCommand {
                        server: name.clone(),
                    })?;
                ServerTransport::Stdio {
                    command: PathBuf::from(expand(&name, &command)?),
                    args: raw
                        .args
                        .iter()
                        .map(|arg| expand(&name, arg))
                        .collect::<Result<_, _>>()?,
                    env: raw
                        .env
                        .into_iter()
                        .map(|(key, value)| Ok((key, expand(&name, &value)?)))
                        .collect::<Result<_, ConfigError>>()?,
                    workdir: raw
                        .workdir
                        .map(|d| expand(&name, &d).map(PathBuf::from))
                        .transpose()?,
                }
            }
            other => {
                return Err(ConfigError::UnknownTransport {
                    server: name,
                    transport: other.to_string(),
                });
            }
        };

        Ok(Self { name, transport })
    }
}

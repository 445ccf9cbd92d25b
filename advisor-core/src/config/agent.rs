use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DISCOVERY_TIMEOUT_MS, DEFAULT_MAX_STEPS,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TOOL_TIMEOUT_MS,
};
use serde::Deserialize;
use std::time::Duration;

/// Agent behaviour: instruction, step ceiling and the deadlines applied while
/// building the session and invoking tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub system_prompt: String,
    pub max_steps: usize,
    pub connect_timeout: Duration,
    pub discovery_timeout: Duration,
    /// `None` leaves tool calls unbounded.
    pub tool_timeout: Option<Duration>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            discovery_timeout: Duration::from_millis(DEFAULT_DISCOVERY_TIMEOUT_MS),
            tool_timeout: Some(Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct RawAgentSettings {
    pub system_prompt: Option<String>,
    pub max_steps: Option<usize>,
    pub connect_timeout_ms: Option<u64>,
    pub discovery_timeout_ms: Option<u64>,
    pub tool_timeout_ms: Option<u64>,
}

impl From<RawAgentSettings> for AgentSettings {
    fn from(raw: RawAgentSettings) -> Self {
        let defaults = Self::default();
        Self {
            system_prompt: raw
                .system_prompt
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.system_prompt),
            max_steps: raw.max_steps.unwrap_or(defaults.max_steps),
            connect_timeout: raw
                .connect_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            discovery_timeout: raw
                .discovery_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.discovery_timeout),
            tool_timeout: match raw.tool_timeout_ms {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.tool_timeout,
            },
        }
    }
}

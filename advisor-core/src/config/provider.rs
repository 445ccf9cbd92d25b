//! # Provider Configuration
//!
//! The model provider the agent streams from. Only the Anthropic Messages
//! API is wired up; the `type` field is kept so the factory can grow.
//!
//! ```toml
//! [provider]
//! type = "anthropic"
//! endpoint = "https://api.anthropic.com"
//! api_key = "ANTHROPIC_API_KEY"
//! model = "claude-haiku-4-5-20251001"
//! max_tokens = 16000
//! thinking_budget = 12000
//! ```

use crate::constants::{
    DEFAULT_ANTHROPIC_ENDPOINT, DEFAULT_ANTHROPIC_KEY_VAR, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_PROVIDER_TYPE, DEFAULT_THINKING_BUDGET,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelProviderConfig {
    /// Determines the wire format, e.g. "anthropic"
    #[serde(rename = "type")]
    pub provider_type: String,
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Extended-reasoning token budget; `None` disables extended thinking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,
}

impl Default for ModelProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: DEFAULT_PROVIDER_TYPE.to_string(),
            endpoint: DEFAULT_ANTHROPIC_ENDPOINT.to_string(),
            api_key: Some(DEFAULT_ANTHROPIC_KEY_VAR.to_string()),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            thinking_budget: Some(DEFAULT_THINKING_BUDGET),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct RawProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub thinking_budget: Option<u32>,
}

impl From<RawProviderConfig> for ModelProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        let defaults = Self::default();
        Self {
            provider_type: raw.provider_type.unwrap_or(defaults.provider_type),
            endpoint: raw.endpoint.unwrap_or(defaults.endpoint),
            api_key: raw.api_key.or(defaults.api_key),
            model: raw.model.unwrap_or(defaults.model),
            max_tokens: raw.max_tokens.unwrap_or(defaults.max_tokens),
            thinking_budget: match raw.thinking_budget {
                Some(0) => None,
                Some(budget) => Some(budget),
                None => defaults.thinking_budget,
            },
        }
    }
}

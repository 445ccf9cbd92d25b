//! Provider factory - creates clients from config

use super::clients::AnthropicClient;
use super::traits::ModelProvider;
use super::types::ModelError;
use crate::config::ModelProviderConfig;
use std::env;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolve API key from environment variable
pub fn resolve_api_key(provider: &str, env_name: Option<&str>) -> Option<String> {
    let Some(raw) = env_name.map(str::trim) else {
        return None;
    };
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating model providers from provider config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates a provider based on provider type.
    ///
    /// Supported types:
    /// - `anthropic`, `claude` → Anthropic Messages API
    pub fn create(config: &ModelProviderConfig) -> Result<Arc<dyn ModelProvider>, ModelError> {
        match config.provider_type.to_lowercase().as_str() {
            "anthropic" | "claude" => {
                let api_key = resolve_api_key(&config.provider_type, config.api_key.as_deref());
                debug!(
                    provider = %config.provider_type,
                    model = %config.model,
                    api_key_present = api_key.is_some(),
                    "Creating model provider"
                );
                let client = AnthropicClient::new(config.endpoint.clone(), api_key)?;
                Ok(Arc::new(client))
            }
            other => Err(ModelError::unsupported_provider(other)),
        }
    }
}

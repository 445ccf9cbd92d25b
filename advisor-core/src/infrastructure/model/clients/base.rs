//! Base HTTP client with shared logic

use crate::infrastructure::model::types::ModelError;
use reqwest::Client;
use reqwest_eventsource::Error as EventSourceError;

/// Base HTTP client with shared functionality
#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(id: String, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            id,
            endpoint,
            api_key,
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    pub fn require_api_key(&self) -> Result<&str, ModelError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::missing_api_key(&self.id))
    }

    /// Translate an event-source failure, reading the error body for HTTP
    /// status failures.
    pub async fn event_source_error(&self, err: EventSourceError) -> ModelError {
        match err {
            EventSourceError::InvalidStatusCode(status, response) => {
                let body = response.text().await.unwrap_or_default();
                ModelError::Http {
                    provider: self.id.clone(),
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                }
            }
            EventSourceError::InvalidContentType(content_type, _) => ModelError::invalid_response(
                &self.id,
                format!("unexpected content type {content_type:?}"),
            ),
            EventSourceError::Transport(source) => ModelError::network(&self.id, source),
            EventSourceError::StreamEnded => {
                ModelError::stream(&self.id, "stream ended before the response finished")
            }
            other => ModelError::stream(&self.id, other.to_string()),
        }
    }
}

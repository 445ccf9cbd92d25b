//! Anthropic Messages API client (streaming)

use super::base::HttpClientBase;
use crate::infrastructure::model::traits::{ModelProvider, ModelStream};
use crate::infrastructure::model::types::{
    ModelError, ModelEvent, ModelRequest, StopReason, Usage,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource, retry::Never};
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER_ID: &str = "anthropic";

/// Anthropic API client
pub struct AnthropicClient {
    base: HttpClientBase,
}

impl AnthropicClient {
    /// Fails when no API key could be resolved.
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self, ModelError> {
        let base = HttpClientBase::new(PROVIDER_ID.to_string(), endpoint, api_key);
        base.require_api_key()?;
        Ok(Self { base })
    }

    pub fn build_request_body(request: &ModelRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": request.messages,
            "stream": true
        });
        if let Some(system) = request.system.as_deref().filter(|s| !s.is_empty()) {
            body["system"] = json!(system);
        }
        if !request.tools.is_empty() {
            body["tools"] = json!(request.tools);
        }
        if let Some(budget) = request.thinking_budget {
            body["thinking"] = json!({
                "type": "enabled",
                "budget_tokens": budget
            });
        }
        body
    }
}

#[async_trait]
impl ModelProvider for AnthropicClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        let api_key = self.base.require_api_key()?;
        let url = self.base.build_url("v1/messages");
        let body = Self::build_request_body(&request);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            thinking_budget = request.thinking_budget,
            "Anthropic streaming request"
        );

        let builder = self
            .base
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let mut source = EventSource::new(builder)
            .map_err(|err| ModelError::invalid_response(&self.base.id, err.to_string()))?;
        source.set_retry_policy(Box::new(Never));

        // Surface HTTP failures to the caller before handing out the stream.
        match source.next().await {
            Some(Ok(Event::Open)) => {}
            Some(Ok(Event::Message(message))) => {
                warn!(event = %message.event, "event received before stream opened");
            }
            Some(Err(err)) => {
                source.close();
                return Err(self.base.event_source_error(err).await);
            }
            None => {
                return Err(ModelError::stream(
                    &self.base.id,
                    "stream closed before it opened",
                ));
            }
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(pump(
            source,
            AnthropicStreamParser::new(&self.base.id),
            self.base.clone(),
            tx,
        ));
        Ok(ReceiverStream::new(rx).boxed())
    }
}

async fn pump(
    mut source: EventSource,
    mut parser: AnthropicStreamParser,
    base: HttpClientBase,
    tx: mpsc::Sender<Result<ModelEvent, ModelError>>,
) {
    let failure = loop {
        let Some(event) = source.next().await else {
            break (!parser.is_finished())
                .then(|| ModelError::stream(&base.id, "stream ended before message_stop"));
        };
        let message = match event {
            Ok(Event::Open) => continue,
            Ok(Event::Message(message)) => message,
            Err(err) => break Some(base.event_source_error(err).await),
        };

        match parser.handle(&message.event, &message.data) {
            Ok(events) => {
                for event in events {
                    if tx.send(Ok(event)).await.is_err() {
                        debug!("model stream receiver dropped; closing request");
                        source.close();
                        return;
                    }
                }
            }
            Err(err) => break Some(err),
        }
        if parser.is_finished() {
            break None;
        }
    };

    source.close();
    if let Some(err) = failure {
        warn!(%err, "Anthropic stream failed");
        let _ = tx.send(Err(err)).await;
    }
}

enum PartialBlock {
    Text,
    Thinking { thinking: String, signature: String },
    RedactedThinking { data: String },
    ToolUse { id: String, name: String, json: String },
}

/// Turns Messages API stream events into [`ModelEvent`]s.
pub struct AnthropicStreamParser {
    provider: String,
    blocks: HashMap<u64, PartialBlock>,
    stop_reason: Option<StopReason>,
    usage: Usage,
    finished: bool,
}

impl AnthropicStreamParser {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            blocks: HashMap::new(),
            stop_reason: None,
            usage: Usage::default(),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Handle one SSE event. `event` is the SSE event name; the `type` field
    /// inside `data` takes precedence when present.
    pub fn handle(&mut self, event: &str, data: &str) -> Result<Vec<ModelEvent>, ModelError> {
        let payload: Value = serde_json::from_str(data).map_err(|err| {
            ModelError::invalid_response(&self.provider, format!("invalid event JSON: {err}"))
        })?;
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(event)
            .to_string();
        let index = payload.get("index").and_then(Value::as_u64).unwrap_or(0);

        let mut out = Vec::new();
        match kind.as_str() {
            "message_start" => {
                self.usage.input_tokens = payload["message"]["usage"]["input_tokens"]
                    .as_u64()
                    .unwrap_or(0);
            }
            "content_block_start" => {
                let block = &payload["content_block"];
                let partial = match block["type"].as_str().unwrap_or("") {
                    "text" => {
                        if let Some(text) = block["text"].as_str().filter(|t| !t.is_empty()) {
                            out.push(ModelEvent::TextDelta(text.to_string()));
                        }
                        PartialBlock::Text
                    }
                    "thinking" => PartialBlock::Thinking {
                        thinking: block["thinking"].as_str().unwrap_or("").to_string(),
                        signature: block["signature"].as_str().unwrap_or("").to_string(),
                    },
                    "redacted_thinking" => PartialBlock::RedactedThinking {
                        data: block["data"].as_str().unwrap_or("").to_string(),
                    },
                    "tool_use" => PartialBlock::ToolUse {
                        id: block["id"].as_str().unwrap_or("").to_string(),
                        name: block["name"].as_str().unwrap_or("").to_string(),
                        json: String::new(),
                    },
                    other => {
                        debug!(block_type = other, "ignoring unknown content block");
                        return Ok(out);
                    }
                };
                self.blocks.insert(index, partial);
            }
            "content_block_delta" => {
                let delta = &payload["delta"];
                match (delta["type"].as_str().unwrap_or(""), self.blocks.get_mut(&index)) {
                    ("text_delta", _) => {
                        if let Some(text) = delta["text"].as_str() {
                            out.push(ModelEvent::TextDelta(text.to_string()));
                        }
                    }
                    ("thinking_delta", Some(PartialBlock::Thinking { thinking, .. })) => {
                        if let Some(text) = delta["thinking"].as_str() {
                            thinking.push_str(text);
                            out.push(ModelEvent::ReasoningDelta(text.to_string()));
                        }
                    }
                    ("signature_delta", Some(PartialBlock::Thinking { signature, .. })) => {
                        if let Some(sig) = delta["signature"].as_str() {
                            signature.push_str(sig);
                        }
                    }
                    ("input_json_delta", Some(PartialBlock::ToolUse { json, .. })) => {
                        if let Some(part) = delta["partial_json"].as_str() {
                            json.push_str(part);
                        }
                    }
                    (other, _) => {
                        debug!(delta_type = other, index, "ignoring unmatched content delta");
                    }
                }
            }
            "content_block_stop" => match self.blocks.remove(&index) {
                Some(PartialBlock::Thinking {
                    thinking,
                    signature,
                }) => out.push(ModelEvent::Reasoning {
                    thinking,
                    signature,
                }),
                Some(PartialBlock::RedactedThinking { data }) => {
                    out.push(ModelEvent::RedactedReasoning { data })
                }
                Some(PartialBlock::ToolUse { id, name, json }) => {
                    let input = if json.trim().is_empty() {
                        json!({})
                    } else {
                        serde_json::from_str(&json).map_err(|err| {
                            ModelError::invalid_response(
                                &self.provider,
                                format!("tool '{name}' input is not valid JSON: {err}"),
                            )
                        })?
                    };
                    out.push(ModelEvent::ToolCall { id, name, input });
                }
                Some(PartialBlock::Text) | None => {}
            },
            "message_delta" => {
                if let Some(reason) = payload["delta"]["stop_reason"].as_str() {
                    self.stop_reason = Some(StopReason::parse(reason));
                }
                if let Some(tokens) = payload["usage"]["output_tokens"].as_u64() {
                    self.usage.output_tokens = tokens;
                }
            }
            "message_stop" => {
                self.finished = true;
                out.push(ModelEvent::Finish {
                    reason: self.stop_reason.clone().unwrap_or(StopReason::EndTurn),
                    usage: self.usage,
                });
            }
            "ping" => {}
            "error" => {
                let message = payload["error"]["message"]
                    .as_str()
                    .unwrap_or("unknown provider error");
                return Err(ModelError::stream(&self.provider, message));
            }
            other => debug!(event = other, "ignoring unknown stream event"),
        }
        Ok(out)
    }
}

use super::adapter::{to_model_messages, value_text};
use super::errors::{StreamError, ToolError};
use super::events::{FinishReason, StreamEvent};
use crate::application::deadline::with_optional_deadline;
use crate::application::session::AgentSession;
use crate::application::tooling::ToolCallOutput;
use crate::domain::types::ConversationTurn;
use crate::infrastructure::model::{
    ContentBlock, ModelEvent, ModelMessage, ModelRequest, StopReason, ToolSpec,
};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_BUFFER: usize = 64;

/// Stream a reply to `history` from a ready session.
///
/// The model/tool loop runs on its own task and pushes events as they are
/// produced. It stops after `max_steps` model calls, when the model stops
/// asking for tools, on the first model error, or when the receiver is
/// dropped.
pub fn stream(session: Arc<AgentSession>, history: Vec<ConversationTurn>) -> ReceiverStream<StreamEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(async move {
        let mut emitter = Emitter { tx };
        if run(&session, &history, &mut emitter).await.is_err() {
            debug!("Stream receiver dropped; stopping agent loop");
        }
    });
    ReceiverStream::new(rx)
}

/// The receiving side went away.
struct Disconnected;

struct Emitter {
    tx: mpsc::Sender<StreamEvent>,
}

impl Emitter {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), Disconnected> {
        self.tx.send(event).await.map_err(|_| Disconnected)
    }
}

/// Open text or reasoning part of the current step.
enum OpenPart {
    Text(String),
    Reasoning(String),
}

struct StepOutcome {
    blocks: Vec<ContentBlock>,
    tool_calls: Vec<(String, String, Value)>,
    stop: StopReason,
}

async fn run(
    session: &AgentSession,
    history: &[ConversationTurn],
    emitter: &mut Emitter,
) -> Result<(), Disconnected> {
    let started = Instant::now();
    emitter
        .emit(StreamEvent::Start {
            message_id: Uuid::new_v4().to_string(),
        })
        .await?;

    let adapted = to_model_messages(history);
    let system = compose_system(session.instructions(), &adapted.system);
    let tools: Vec<ToolSpec> = session
        .namespace()
        .iter()
        .map(|tool| ToolSpec {
            name: tool.name().to_string(),
            description: tool.description().map(str::to_string),
            input_schema: tool.input_schema().clone(),
        })
        .collect();
    let mut messages = adapted.messages;
    let max_steps = session.max_steps();
    let mut steps = 0;

    let finish_reason = loop {
        steps += 1;
        emitter.emit(StreamEvent::StartStep).await?;

        let request = ModelRequest {
            model: session.model_id().to_string(),
            system: system.clone(),
            messages: messages.clone(),
            tools: tools.clone(),
            max_tokens: session.max_tokens(),
            thinking_budget: session.thinking_budget(),
        };
        let step = match run_step(session, request, emitter).await? {
            Ok(step) => step,
            Err(err) => {
                warn!(step = steps, %err, "Agent step failed");
                emitter
                    .emit(StreamEvent::Error {
                        error_text: err.user_message(),
                    })
                    .await?;
                return Ok(());
            }
        };

        if !step.blocks.is_empty() {
            messages.push(ModelMessage::assistant(step.blocks));
        }
        if step.tool_calls.is_empty() {
            emitter.emit(StreamEvent::FinishStep).await?;
            break match step.stop {
                StopReason::MaxTokens => FinishReason::Length,
                StopReason::Other(_) => FinishReason::Other,
                _ => FinishReason::Stop,
            };
        }

        let mut results = Vec::with_capacity(step.tool_calls.len());
        for (id, name, input) in step.tool_calls {
            let result = match execute_tool(session, &name, input).await {
                Ok(output) => {
                    let value = output.model_value();
                    emitter
                        .emit(StreamEvent::ToolOutputAvailable {
                            tool_call_id: id.clone(),
                            output: value.clone(),
                        })
                        .await?;
                    ContentBlock::tool_result(id, value_text(&value), false)
                }
                Err(err) => {
                    let error_text = err.to_string();
                    emitter
                        .emit(StreamEvent::ToolOutputError {
                            tool_call_id: id.clone(),
                            error_text: error_text.clone(),
                        })
                        .await?;
                    ContentBlock::tool_result(id, error_text, true)
                }
            };
            results.push(result);
        }
        messages.push(ModelMessage::user(results));
        emitter.emit(StreamEvent::FinishStep).await?;

        if steps >= max_steps {
            warn!(max_steps, "Step ceiling reached; ending agent loop");
            break FinishReason::ToolCalls;
        }
    };

    info!(
        steps,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ?finish_reason,
        "Agent stream finished"
    );
    emitter.emit(StreamEvent::Finish { finish_reason }).await
}

/// One model call. The outer result reports a dropped receiver, the inner
/// one a model failure.
async fn run_step(
    session: &AgentSession,
    request: ModelRequest,
    emitter: &mut Emitter,
) -> Result<Result<StepOutcome, StreamError>, Disconnected> {
    let mut events = match session.model().stream(request).await {
        Ok(events) => events,
        Err(err) => return Ok(Err(err.into())),
    };

    let mut blocks = Vec::new();
    let mut tool_calls = Vec::new();
    let mut open: Option<OpenPart> = None;

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                close_part(&mut open, emitter).await?;
                return Ok(Err(err.into()));
            }
        };
        match event {
            ModelEvent::TextDelta(delta) if delta.is_empty() => {}
            ModelEvent::TextDelta(delta) => {
                let current = match &open {
                    Some(OpenPart::Text(id)) => Some(id.clone()),
                    _ => None,
                };
                let id = match current {
                    Some(id) => id,
                    None => {
                        close_part(&mut open, emitter).await?;
                        let id = Uuid::new_v4().to_string();
                        emitter.emit(StreamEvent::TextStart { id: id.clone() }).await?;
                        blocks.push(ContentBlock::text(""));
                        open = Some(OpenPart::Text(id.clone()));
                        id
                    }
                };
                if let Some(ContentBlock::Text { text }) = blocks.last_mut() {
                    text.push_str(&delta);
                }
                emitter.emit(StreamEvent::TextDelta { id, delta }).await?;
            }
            ModelEvent::ReasoningDelta(delta) => {
                let current = match &open {
                    Some(OpenPart::Reasoning(id)) => Some(id.clone()),
                    _ => None,
                };
                let id = match current {
                    Some(id) => id,
                    None => {
                        close_part(&mut open, emitter).await?;
                        let id = Uuid::new_v4().to_string();
                        emitter
                            .emit(StreamEvent::ReasoningStart { id: id.clone() })
                            .await?;
                        open = Some(OpenPart::Reasoning(id.clone()));
                        id
                    }
                };
                emitter.emit(StreamEvent::ReasoningDelta { id, delta }).await?;
            }
            ModelEvent::Reasoning {
                thinking,
                signature,
            } => {
                close_part(&mut open, emitter).await?;
                blocks.push(ContentBlock::Thinking {
                    thinking,
                    signature,
                });
            }
            ModelEvent::RedactedReasoning { data } => {
                close_part(&mut open, emitter).await?;
                blocks.push(ContentBlock::RedactedThinking { data });
            }
            ModelEvent::ToolCall { id, name, input } => {
                close_part(&mut open, emitter).await?;
                emitter
                    .emit(StreamEvent::ToolInputAvailable {
                        tool_call_id: id.clone(),
                        tool_name: name.clone(),
                        input: input.clone(),
                    })
                    .await?;
                blocks.push(ContentBlock::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                });
                tool_calls.push((id, name, input));
            }
            ModelEvent::Finish { reason, usage } => {
                close_part(&mut open, emitter).await?;
                debug!(
                    ?reason,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    tool_calls = tool_calls.len(),
                    "Model step finished"
                );
                return Ok(Ok(StepOutcome {
                    blocks,
                    tool_calls,
                    stop: reason,
                }));
            }
        }
    }

    close_part(&mut open, emitter).await?;
    Ok(Err(StreamError::Incomplete))
}

async fn close_part(open: &mut Option<OpenPart>, emitter: &mut Emitter) -> Result<(), Disconnected> {
    match open.take() {
        Some(OpenPart::Text(id)) => emitter.emit(StreamEvent::TextEnd { id }).await,
        Some(OpenPart::Reasoning(id)) => emitter.emit(StreamEvent::ReasoningEnd { id }).await,
        None => Ok(()),
    }
}

/// Invoke one tool under the session's tool deadline.
async fn execute_tool(
    session: &AgentSession,
    name: &str,
    input: Value,
) -> Result<ToolCallOutput, ToolError> {
    let Some(tool) = session.namespace().get(name) else {
        warn!(tool = name, "Model requested an unknown tool");
        return Err(ToolError::UnknownTool(name.to_string()));
    };

    let started = Instant::now();
    let failure = format!("tool '{name}' did not finish in time");
    let outcome = with_optional_deadline(tool.invoke(input), session.tool_timeout(), failure).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(output)) if output.is_error => {
            info!(tool = name, server = tool.server(), elapsed_ms, "Tool reported an error");
            Err(ToolError::Reported {
                tool: name.to_string(),
                message: if output.text.is_empty() {
                    format!("tool '{name}' reported an error")
                } else {
                    output.text
                },
            })
        }
        Ok(Ok(output)) => {
            info!(tool = name, server = tool.server(), elapsed_ms, "Tool call finished");
            Ok(output)
        }
        Ok(Err(source)) => {
            warn!(tool = name, server = tool.server(), elapsed_ms, %source, "Tool call failed");
            Err(ToolError::Invoke {
                tool: name.to_string(),
                source,
            })
        }
        Err(source) => {
            warn!(tool = name, server = tool.server(), elapsed_ms, "Tool call timed out");
            Err(ToolError::Timeout {
                tool: name.to_string(),
                source,
            })
        }
    }
}

fn compose_system(instructions: &str, extra: &[String]) -> Option<String> {
    let mut parts: Vec<&str> = Vec::with_capacity(extra.len() + 1);
    if !instructions.trim().is_empty() {
        parts.push(instructions);
    }
    parts.extend(extra.iter().map(String::as_str));
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

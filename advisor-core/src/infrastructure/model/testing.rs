//! Scripted provider used by unit tests across the crate.

use super::traits::{ModelProvider, ModelStream};
use super::types::{ModelError, ModelEvent, ModelRequest, StopReason, Usage};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Plays back one scripted turn per `stream` call. When the script runs out
/// the last turn is repeated.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Vec<ModelEvent>>>,
    last: Mutex<Option<Vec<ModelEvent>>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<Vec<ModelEvent>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

pub fn text_turn(text: &str) -> Vec<ModelEvent> {
    vec![
        ModelEvent::TextDelta(text.to_string()),
        ModelEvent::Finish {
            reason: StopReason::EndTurn,
            usage: Usage::default(),
        },
    ]
}

pub fn tool_turn(id: &str, name: &str, input: Value) -> Vec<ModelEvent> {
    vec![
        ModelEvent::ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input,
        },
        ModelEvent::Finish {
            reason: StopReason::ToolUse,
            usage: Usage::default(),
        },
    ]
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        self.requests.lock().expect("requests lock").push(request);
        let next = self.turns.lock().expect("turns lock").pop_front();
        let turn = match next {
            Some(turn) => {
                *self.last.lock().expect("last lock") = Some(turn.clone());
                turn
            }
            None => self
                .last
                .lock()
                .expect("last lock")
                .clone()
                .ok_or_else(|| ModelError::stream("scripted", "script is empty"))?,
        };
        Ok(futures::stream::iter(turn.into_iter().map(Ok)).boxed())
    }
}

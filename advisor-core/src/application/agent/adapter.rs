//! Conversion from caller history to model-facing messages.

use crate::domain::types::{ConversationTurn, MessageRole, PartView, ToolOutcome};
use crate::infrastructure::model::{ContentBlock, ModelMessage};
use serde_json::Value;

/// Caller history in model form. System turns are lifted out so they can be
/// appended to the session instruction.
#[derive(Debug, Default, PartialEq)]
pub struct AdaptedHistory {
    pub system: Vec<String>,
    pub messages: Vec<ModelMessage>,
}

pub fn to_model_messages(turns: &[ConversationTurn]) -> AdaptedHistory {
    let mut adapted = AdaptedHistory::default();
    for turn in turns {
        match turn.role {
            MessageRole::System => {
                let text = joined_text(turn);
                if !text.is_empty() {
                    adapted.system.push(text);
                }
            }
            MessageRole::User => {
                let content: Vec<_> = turn
                    .parts
                    .iter()
                    .filter_map(|part| match part.view() {
                        PartView::Text(text) if !text.is_empty() => Some(ContentBlock::text(text)),
                        _ => None,
                    })
                    .collect();
                if !content.is_empty() {
                    adapted.messages.push(ModelMessage::user(content));
                }
            }
            MessageRole::Assistant => push_assistant(turn, &mut adapted.messages),
        }
    }
    adapted
}

/// An assistant UI message may span several steps (`step-start` parts).
/// Each step becomes an assistant message, followed by a user message with
/// the results of the tools it called. Tool parts without an outcome are
/// dropped, as are reasoning parts (their signatures are not kept by
/// clients).
fn push_assistant(turn: &ConversationTurn, messages: &mut Vec<ModelMessage>) {
    let mut blocks = Vec::new();
    let mut results = Vec::new();

    for part in &turn.parts {
        if part.kind == "step-start" {
            flush_step(&mut blocks, &mut results, messages);
            continue;
        }
        match part.view() {
            PartView::Text(text) if !text.is_empty() => blocks.push(ContentBlock::text(text)),
            PartView::Tool {
                call_id,
                name,
                input,
                outcome: Some(outcome),
            } => {
                blocks.push(ContentBlock::ToolUse {
                    id: call_id.to_string(),
                    name: name.to_string(),
                    input: input.cloned().unwrap_or_else(|| Value::Object(Default::default())),
                });
                results.push(match outcome {
                    ToolOutcome::Output(value) => {
                        ContentBlock::tool_result(call_id, value_text(value), false)
                    }
                    ToolOutcome::Error(message) => ContentBlock::tool_result(call_id, message, true),
                });
            }
            _ => {}
        }
    }
    flush_step(&mut blocks, &mut results, messages);
}

fn flush_step(
    blocks: &mut Vec<ContentBlock>,
    results: &mut Vec<ContentBlock>,
    messages: &mut Vec<ModelMessage>,
) {
    if !blocks.is_empty() {
        messages.push(ModelMessage::assistant(std::mem::take(blocks)));
    }
    if !results.is_empty() {
        messages.push(ModelMessage::user(std::mem::take(results)));
    }
}

fn joined_text(turn: &ConversationTurn) -> String {
    turn.parts
        .iter()
        .filter_map(|part| match part.view() {
            PartView::Text(text) => Some(text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text handed to the model for a tool result.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_text_becomes_text_block() {
        let adapted = to_model_messages(&[ConversationTurn::user_text(
            "pack 10 1-core jobs at minimum cost",
        )]);
        assert!(adapted.system.is_empty());
        assert_eq!(
            adapted.messages,
            vec![ModelMessage::user(vec![ContentBlock::text(
                "pack 10 1-core jobs at minimum cost"
            )])]
        );
    }

    #[test]
    fn assistant_steps_split_into_tool_use_and_result_pairs() {
        let turns: Vec<ConversationTurn> = serde_json::from_value(json!([
            {"role": "system", "parts": [{"type": "text", "text": "Prefer us-east-1."}]},
            {"role": "user", "parts": [{"type": "text", "text": "price it"}]},
            {"role": "assistant", "parts": [
                {"type": "step-start"},
                {"type": "reasoning", "text": "need catalog"},
                {"type": "tool-get_instances", "toolCallId": "c1", "state": "output-available",
                 "input": {}, "output": {"instances": []}},
                {"type": "step-start"},
                {"type": "tool-solve_constraint", "toolCallId": "c2", "state": "output-error",
                 "input": {"model": "m"}, "errorText": "timeout"},
                {"type": "tool-solve_constraint", "toolCallId": "c3", "state": "input-available",
                 "input": {"model": "m"}},
                {"type": "step-start"},
                {"type": "text", "text": "Done."}
            ]}
        ]))
        .expect("turns");

        let adapted = to_model_messages(&turns);
        assert_eq!(adapted.system, vec!["Prefer us-east-1.".to_string()]);
        assert_eq!(
            adapted.messages,
            vec![
                ModelMessage::user(vec![ContentBlock::text("price it")]),
                ModelMessage::assistant(vec![ContentBlock::ToolUse {
                    id: "c1".to_string(),
                    name: "get_instances".to_string(),
                    input: json!({}),
                }]),
                ModelMessage::user(vec![ContentBlock::tool_result(
                    "c1",
                    "{\"instances\":[]}",
                    false
                )]),
                ModelMessage::assistant(vec![ContentBlock::ToolUse {
                    id: "c2".to_string(),
                    name: "solve_constraint".to_string(),
                    input: json!({"model": "m"}),
                }]),
                ModelMessage::user(vec![ContentBlock::tool_result("c2", "timeout", true)]),
                ModelMessage::assistant(vec![ContentBlock::text("Done.")]),
            ]
        );
    }

    #[test]
    fn history_is_not_mutated() {
        let turns = vec![ConversationTurn::user_text("hello")];
        let before = turns.clone();
        let _ = to_model_messages(&turns);
        assert_eq!(turns, before);
    }
}

use serde::Serialize;
use serde_json::Value;

/// One chunk of the UI message stream. Serialized as
/// `{"type": "text-delta", "id": ..., "delta": ...}` and so on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    Start {
        message_id: String,
    },
    StartStep,
    ReasoningStart {
        id: String,
    },
    ReasoningDelta {
        id: String,
        delta: String,
    },
    ReasoningEnd {
        id: String,
    },
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    ToolInputAvailable {
        tool_call_id: String,
        tool_name: String,
        input: Value,
    },
    ToolOutputAvailable {
        tool_call_id: String,
        output: Value,
    },
    ToolOutputError {
        tool_call_id: String,
        error_text: String,
    },
    FinishStep,
    Finish {
        finish_reason: FinishReason,
    },
    Error {
        error_text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    /// The last step still asked for tools; reached when the step ceiling
    /// cuts the loop short.
    ToolCalls,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_use_ui_stream_field_names() {
        let event = StreamEvent::ToolOutputError {
            tool_call_id: "call-1".to_string(),
            error_text: "timed out".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({"type": "tool-output-error", "toolCallId": "call-1", "errorText": "timed out"})
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::StartStep).expect("serialize"),
            json!({"type": "start-step"})
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::Finish {
                finish_reason: FinishReason::ToolCalls
            })
            .expect("serialize"),
            json!({"type": "finish", "finishReason": "tool-calls"})
        );
    }
}

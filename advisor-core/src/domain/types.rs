use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged message of the caller's history, in the UI message shape
/// chat front-ends send (`{ id, role, parts: [...] }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConversationTurn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: MessageRole,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl ConversationTurn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            role: MessageRole::User,
            parts: vec![MessagePart::text(text)],
        }
    }
}

/// A single message part. The `type` tag is kept as a string because tool
/// parts carry the tool name in it (`tool-get_instances`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessagePart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "toolCallId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_call_id: Option<String>,
    #[serde(rename = "toolName", default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub output: Option<Value>,
    #[serde(rename = "errorText", default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Borrowed interpretation of a [`MessagePart`].
#[derive(Debug, Clone, PartialEq)]
pub enum PartView<'a> {
    Text(&'a str),
    Reasoning(&'a str),
    Tool {
        call_id: &'a str,
        name: &'a str,
        input: Option<&'a Value>,
        outcome: Option<ToolOutcome<'a>>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome<'a> {
    Output(&'a Value),
    Error(&'a str),
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            tool_call_id: None,
            tool_name: None,
            input: None,
            output: None,
            error_text: None,
            state: None,
        }
    }

    pub fn view(&self) -> PartView<'_> {
        match self.kind.as_str() {
            "text" => PartView::Text(self.text.as_deref().unwrap_or_default()),
            "reasoning" => PartView::Reasoning(self.text.as_deref().unwrap_or_default()),
            kind => {
                let name = match kind.strip_prefix("tool-") {
                    Some(name) => Some(name),
                    None if kind == "dynamic-tool" => self.tool_name.as_deref(),
                    None => None,
                };
                match (name, self.tool_call_id.as_deref()) {
                    (Some(name), Some(call_id)) => PartView::Tool {
                        call_id,
                        name,
                        input: self.input.as_ref(),
                        outcome: self.outcome(),
                    },
                    _ => PartView::Other,
                }
            }
        }
    }

    fn outcome(&self) -> Option<ToolOutcome<'_>> {
        match self.state.as_deref() {
            Some("output-error") => Some(ToolOutcome::Error(
                self.error_text.as_deref().unwrap_or("tool execution failed"),
            )),
            _ => self.output.as_ref().map(ToolOutcome::Output),
        }
    }
}

use crate::application::namespace::{NameCollision, ToolNamespace};
use crate::application::session::SessionStatus;
use crate::domain::types::ConversationTurn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body of `POST /api/chat`: the full conversation so far.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChatRequestBody {
    pub messages: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub server: String,
    #[schema(value_type = Object)]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollisionSummary {
    pub name: String,
    pub previous_server: String,
    pub winning_server: String,
}

impl From<&NameCollision> for CollisionSummary {
    fn from(collision: &NameCollision) -> Self {
        Self {
            name: collision.name.clone(),
            previous_server: collision.previous_server.clone(),
            winning_server: collision.winning_server.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolInventoryResponse {
    pub tools: Vec<ToolSummary>,
    pub collisions: Vec<CollisionSummary>,
}

impl From<&ToolNamespace> for ToolInventoryResponse {
    fn from(namespace: &ToolNamespace) -> Self {
        Self {
            tools: namespace
                .iter()
                .map(|tool| ToolSummary {
                    name: tool.name().to_string(),
                    description: tool.description().map(str::to_string),
                    server: tool.server().to_string(),
                    input_schema: tool.input_schema().clone(),
                })
                .collect(),
            collisions: namespace
                .collisions()
                .iter()
                .map(CollisionSummary::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub session: SessionStatus,
    pub builds_started: u64,
}

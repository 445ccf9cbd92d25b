use super::dto::{
    ChatRequestBody, CollisionSummary, ErrorResponse, HealthResponse, ToolInventoryResponse,
    ToolSummary,
};
use super::routes;
use crate::application::session::SessionStatus;
use crate::domain::types::{ConversationTurn, MessagePart, MessageRole};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::chat::chat_handler,
        routes::tools::tools_handler,
        routes::downloads::download_handler,
        routes::health::health_handler
    ),
    components(
        schemas(
            ChatRequestBody,
            ConversationTurn,
            MessagePart,
            MessageRole,
            ErrorResponse,
            ToolInventoryResponse,
            ToolSummary,
            CollisionSummary,
            HealthResponse,
            SessionStatus
        )
    ),
    tags(
        (name = "chat", description = "Streamed conversations with the provisioning agent"),
        (name = "tools", description = "Tools aggregated from the configured MCP servers"),
        (name = "downloads", description = "Static configuration files"),
        (name = "health", description = "Liveness and session state")
    )
)]
pub(super) struct ApiDoc;

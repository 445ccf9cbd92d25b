use super::super::dto::{ErrorResponse, ToolInventoryResponse};
use super::super::error::ApiError;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;
use tracing::debug;

#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Tools of the ready session", body = ToolInventoryResponse),
        (status = 502, description = "Agent session could not be built", body = ErrorResponse),
        (status = 504, description = "A tool server did not answer in time", body = ErrorResponse)
    )
)]
pub async fn tools_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ToolInventoryResponse>, ApiError> {
    let session = state.sessions().acquire().await?;
    let namespace = session.namespace();
    debug!(
        tool_count = namespace.len(),
        collisions = namespace.collisions().len(),
        "Serving /api/tools request"
    );
    Ok(Json(ToolInventoryResponse::from(namespace)))
}

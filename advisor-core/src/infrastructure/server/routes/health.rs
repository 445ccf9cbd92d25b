use super::super::dto::HealthResponse;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

/// Reports the session state without starting a build.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Server is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let sessions = state.sessions();
    Json(HealthResponse {
        status: "ok".to_string(),
        session: sessions.status(),
        builds_started: sessions.builds_started(),
    })
}

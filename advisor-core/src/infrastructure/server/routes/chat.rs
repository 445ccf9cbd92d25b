use super::super::dto::{ChatRequestBody, ErrorResponse};
use super::super::error::ApiError;
use super::super::state::ServerState;
use crate::application::agent;
use crate::constants::{UI_STREAM_HEADER, UI_STREAM_VERSION};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderValue;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Terminates the UI message stream.
const DONE_MARKER: &str = "[DONE]";

#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "UI message stream, one JSON event per SSE frame", content_type = "text/event-stream", body = String),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 502, description = "Agent session could not be built", body = ErrorResponse),
        (status = 504, description = "A tool server did not answer in time", body = ErrorResponse)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(status = %rejection.status(), "Rejecting /api/chat request with malformed body");
        ApiError::MalformedRequest(rejection.body_text())
    })?;
    if body.messages.is_empty() {
        warn!("Rejecting /api/chat request without messages");
        return Err(ApiError::MalformedRequest(
            "messages must not be empty".to_string(),
        ));
    }

    info!(messages = body.messages.len(), "Received /api/chat request");
    let session = state.sessions().acquire().await.map_err(|err| {
        error!(%err, timeout = err.is_timeout(), "Agent session unavailable");
        ApiError::from(err)
    })?;

    let events = agent::stream(session, body.messages)
        .map(|event| Event::default().json_data(event))
        .chain(stream::once(async {
            Ok::<_, axum::Error>(Event::default().data(DONE_MARKER))
        }));

    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    response.headers_mut().insert(
        UI_STREAM_HEADER,
        HeaderValue::from_static(UI_STREAM_VERSION),
    );
    Ok(response)
}

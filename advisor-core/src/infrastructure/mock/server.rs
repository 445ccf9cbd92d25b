use super::catalog::handle_rpc;
use crate::infrastructure::server::ServerError;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt, stream};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

const SESSION_BUFFER: usize = 32;
const HEARTBEAT: Duration = Duration::from_secs(30);

type Sessions = Mutex<HashMap<String, mpsc::Sender<Value>>>;

#[derive(Default)]
struct MockState {
    sessions: Sessions,
}

impl MockState {
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, mpsc::Sender<Value>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the session when its SSE stream is dropped.
struct SessionGuard {
    id: String,
    state: Arc<MockState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.sessions().remove(&self.id);
        info!(session = self.id.as_str(), "Mock SSE connection closed");
    }
}

pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/sse", get(open_stream))
        .route("/message", post(post_message))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(cors)
        .with_state(Arc::new(MockState::default()))
}

pub async fn serve(addr: SocketAddr) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_listener(listener).await
}

pub async fn serve_listener(listener: TcpListener) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Mock MCP server listening; SSE endpoint at /sse");
    }
    axum::serve(listener, router().into_make_service())
        .await
        .map_err(ServerError::Serve)
}

async fn open_stream(
    State(state): State<Arc<MockState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel(SESSION_BUFFER);
    state.sessions().insert(id.clone(), tx);
    info!(session = id.as_str(), "Mock SSE connection opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/message?sessionId={id}"));
    let guard = SessionGuard {
        id,
        state: Arc::clone(&state),
    };
    let messages = ReceiverStream::new(rx).map(move |message: Value| {
        let _session = &guard;
        Ok(Event::default().event("message").data(message.to_string()))
    });

    Sse::new(stream::once(async move { Ok(endpoint) }).chain(messages))
        .keep_alive(KeepAlive::new().interval(HEARTBEAT).text("heartbeat"))
}

async fn post_message(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    let sender = query
        .get("sessionId")
        .and_then(|id| state.sessions().get(id).cloned());
    let Some(sender) = sender else {
        warn!("Mock message for unknown session");
        return error(StatusCode::BAD_REQUEST, "Invalid or expired session");
    };

    let message: Value = match serde_json::from_str(&body) {
        Ok(message) => message,
        Err(err) => {
            warn!(%err, "Mock message is not valid JSON");
            return error(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    if let Some(reply) = handle_rpc(&message) {
        if sender.send(reply).await.is_err() {
            debug!("Mock SSE stream closed before the reply was sent");
        }
    }
    (StatusCode::ACCEPTED, Json(json!({"status": "accepted"}))).into_response()
}

async fn health(State(state): State<Arc<MockState>>) -> Json<Value> {
    let sessions = state.sessions().len();
    Json(json!({"status": "ok", "sessions": sessions}))
}

async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Not found")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the application router. An empty origin list allows any origin.
pub fn router(state: Arc<ServerState>, cors_origins: &[String]) -> Router {
    let api = ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", api))
        .route("/api/chat", post(routes::chat::chat_handler))
        .route("/api/tools", get(routes::tools::tools_handler))
        .route(
            "/api/downloads/{name}",
            get(routes::downloads::download_handler),
        )
        .route("/health", get(routes::health::health_handler))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = origin.as_str(), "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(
    state: Arc<ServerState>,
    addr: SocketAddr,
    cors_origins: &[String],
) -> Result<(), ServerError> {
    info!(%addr, "Binding HTTP server");
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_listener(listener, router(state, cors_origins)).await
}

/// Serve on an already bound listener.
pub async fn serve_listener(listener: TcpListener, app: Router) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server ready to accept connections");
    }
    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

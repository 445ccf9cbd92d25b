use super::super::dto::ErrorResponse;
use super::super::error::ApiError;
use super::super::state::ServerState;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

#[utoipa::path(
    get,
    path = "/api/downloads/{name}",
    tag = "downloads",
    params(("name" = String, Path, description = "Configured download name")),
    responses(
        (status = 200, description = "File served as an attachment", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "Unknown download or missing file", body = ErrorResponse)
    )
)]
pub async fn download_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let Some(download) = state.download(&name) else {
        warn!(name = name.as_str(), "Unknown download requested");
        return Err(ApiError::DownloadNotFound(name));
    };

    let bytes = match tokio::fs::read(&download.path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(name = name.as_str(), path = %download.path.display(), "Download file is missing");
            return Err(ApiError::DownloadNotFound(name));
        }
        Err(source) => {
            warn!(name = name.as_str(), path = %download.path.display(), %source, "Download file is unreadable");
            return Err(ApiError::DownloadUnreadable { name, source });
        }
    };

    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let file_name = download
        .path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(download.name.as_str());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    info!(name = name.as_str(), bytes = bytes.len(), "Serving download");
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

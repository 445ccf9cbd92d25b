use super::dto::ErrorResponse;
use crate::application::session::SessionError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Serve(#[from] io::Error),
}

/// Failures a handler reports as `{ "error": ... }` with a non-2xx status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("download '{0}' not found")]
    DownloadNotFound(String),
    #[error("failed to read download '{name}': {source}")]
    DownloadUnreadable {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Session(_) => StatusCode::BAD_GATEWAY,
            ApiError::DownloadNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DownloadUnreadable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::MalformedRequest(detail) => format!("Invalid request: {detail}"),
            ApiError::Session(err) => err.user_message(),
            ApiError::DownloadNotFound(_) => "Configuration file not found".to_string(),
            ApiError::DownloadUnreadable { .. } => "Failed to read configuration file".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

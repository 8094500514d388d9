use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every failure a request can end with. Each variant maps to exactly one
/// HTTP status and is rendered as `{ "error": message }`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed required fields.
    #[error("{0}")]
    Validation(String),
    /// Bad shared secret on a push endpoint.
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    /// Broker API or network failure; the message is passed through.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Upstream(msg) | AppError::Unexpected(msg) => {
                tracing::error!(status = status.as_u16(), "request failed: {msg}");
            }
            other => {
                tracing::debug!(status = status.as_u16(), "request rejected: {other}");
            }
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

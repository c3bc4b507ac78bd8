//! Application error handling
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse` impl
//! turns the error into a JSON body with a machine-readable tag and a
//! human-readable message. Debug builds additionally carry the debug
//! representation to ease local troubleshooting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    UploadTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Document(e) => e.status_code(),
            Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Document(e) => e.kind(),
            Self::InvalidUpload(_) => "invalid_upload",
            Self::UploadTooLarge { .. } => "upload_too_large",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let details = if cfg!(debug_assertions) {
            Some(format!("{:?}", self))
        } else {
            None
        };
        let body = ErrorResponse {
            error: self.kind(),
            message: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

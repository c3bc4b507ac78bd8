//! Document-level errors

use axum::http::StatusCode;

use crate::ocr::OcrError;
use crate::pdf::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("No document loaded")]
    NoDocumentLoaded,

    #[error("No OCR result available yet")]
    NoOcrResult,

    #[error("Invalid position: {0}")]
    InvalidPosition(i64),

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { page: usize, page_count: usize },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Render(RenderError),
}

impl From<RenderError> for DocumentError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::PageOutOfRange { page, page_count } => {
                Self::PageIndexOutOfRange { page, page_count }
            }
            other => Self::Render(other),
        }
    }
}

impl DocumentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoDocumentLoaded => StatusCode::NOT_FOUND,
            Self::NoOcrResult => StatusCode::CONFLICT,
            Self::InvalidPosition(_) => StatusCode::BAD_REQUEST,
            Self::PageIndexOutOfRange { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ocr(e) => e.status_code(),
            Self::Render(e) => e.status_code(),
        }
    }

    /// Machine-readable error tag used in JSON responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoDocumentLoaded => "no_document_loaded",
            Self::NoOcrResult => "no_ocr_result",
            Self::InvalidPosition(_) => "invalid_position",
            Self::PageIndexOutOfRange { .. } => "page_out_of_range",
            Self::Timeout(_) => "timeout",
            Self::Ocr(_) => "ocr_failure",
            Self::Render(_) => "render_failure",
        }
    }
}

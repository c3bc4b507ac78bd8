//! PDF renderer types
//!
//! Types for the document-renderer collaborator: page geometry in PDF
//! points and the drawing primitives the highlighter emits.

use serde::{Deserialize, Serialize};

/// Page geometry in renderer units (PDF points, 72 per inch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

/// Rectangle to draw, in renderer units.
///
/// `x` is measured rightward from the page's left edge and `y` downward
/// from the page's top edge. A negative `height` extends the rectangle
/// further down the page; this mirrors how bounding boxes arrive from the
/// raster space, where the top edge has the smaller y value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fill color, normalized 0-1 per channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl HighlightColor {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Renderer error types
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Encrypted documents are not supported")]
    Encrypted,

    #[error("Page {page} out of range (page count {page_count})")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("Failed to save document: {0}")]
    Save(String),
}

impl RenderError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Load(_) | Self::Encrypted => StatusCode::BAD_REQUEST,
            Self::PageOutOfRange { .. } | Self::Save(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

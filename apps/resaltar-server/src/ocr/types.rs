//! OCR Types
//!
//! The recognized-document hierarchy produced by OCR providers:
//! pages → paragraphs → lines → words, every element carrying a bounding
//! box in the provider's raster-pixel coordinate space.

use serde::{Deserialize, Serialize};

/// OCR provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    /// Tesseract via subprocess (pdftoppm + tesseract)
    Tesseract,
    /// Remote OCR service over HTTP
    Remote,
}

impl Default for OcrProvider {
    fn default() -> Self {
        Self::Tesseract
    }
}

/// Axis-aligned bounding box in OCR raster pixels.
///
/// `top` < `bottom`: the raster origin is the top-left corner and y grows
/// downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Page dimensions as reported by the OCR raster (pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

/// A single recognized word
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrWord {
    /// Recognized text
    pub text: String,
    /// Confidence score (0-100)
    pub confidence: f64,
    /// Bounding box in page pixels
    pub bbox: BoundingBox,
}

/// A recognized text line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrLine {
    pub bbox: BoundingBox,
    pub words: Vec<OcrWord>,
}

/// A recognized paragraph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrParagraph {
    pub bbox: BoundingBox,
    pub lines: Vec<OcrLine>,
}

/// A recognized page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrPage {
    /// Page number (1-based, matching the raster order)
    pub number: usize,
    /// Raster dimensions the bounding boxes are expressed in
    pub dims: PageDimensions,
    pub paragraphs: Vec<OcrParagraph>,
}

impl OcrPage {
    /// Total number of words on the page
    pub fn word_count(&self) -> usize {
        self.paragraphs
            .iter()
            .flat_map(|par| par.lines.iter())
            .map(|line| line.words.len())
            .sum()
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("Unusable OCR output: {0}")]
    InvalidOutput(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::ProviderNotAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

//! Phrase-highlighting OCR server
//!
//! Upload a PDF, let OCR recover its text layout, then either search for
//! a phrase (every matching word gets a translucent rectangle) or seek a
//! character offset (the owning paragraph gets one). The highlighted
//! output is always rebuilt from the original upload, so highlights never
//! stack.

pub mod config;
pub mod document;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod routes;
pub mod state;

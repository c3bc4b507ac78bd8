//! Server configuration
//!
//! Everything comes from environment variables with defaults that work
//! for local development; a `.env` file is honored via dotenvy.

use std::env;

use anyhow::{Context, Result};

use crate::ocr::OcrProvider;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub preferred_provider: OcrProvider,
    /// Tesseract language code(s), e.g. "eng" or "spa+eng"
    pub language: String,
    /// Raster resolution for the OCR pass
    pub dpi: u32,
    /// Base URL of a remote OCR service, if one is configured
    pub remote_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Largest accepted document in bytes
    pub max_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("SERVER_PORT must be a number")?,
        };

        let preferred_provider = match env::var("OCR_PROVIDER").as_deref() {
            Ok("remote") => OcrProvider::Remote,
            _ => OcrProvider::Tesseract,
        };
        let ocr = OcrConfig {
            preferred_provider,
            language: env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string()),
            dpi: env::var("OCR_DPI")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("OCR_DPI must be a number")?,
            remote_endpoint: env::var("OCR_REMOTE_ENDPOINT").ok(),
        };

        let upload = UploadConfig {
            max_size: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
                .parse()
                .context("MAX_UPLOAD_BYTES must be a number")?,
        };

        Ok(Self {
            server,
            ocr,
            upload,
        })
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            preferred_provider: OcrProvider::Tesseract,
            language: "eng".to_string(),
            dpi: 300,
            remote_endpoint: None,
        }
    }
}

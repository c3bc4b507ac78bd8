//! OCR providers
//!
//! A provider turns raw PDF bytes into the page/paragraph/line/word
//! hierarchy. The default is a local tesseract pipeline (pdftoppm raster
//! pass, then tesseract TSV per page); a remote HTTP provider can stand in
//! when the binaries are not installed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
#[cfg(test)]
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use uuid::Uuid;

use super::types::{
    BoundingBox, OcrError, OcrLine, OcrPage, OcrParagraph, OcrProvider, OcrWord, PageDimensions,
};

/// Interface all OCR providers implement
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Which provider this is
    fn provider_type(&self) -> OcrProvider;

    /// Check whether the provider can run in this environment
    async fn is_available(&self) -> bool;

    /// Recognize every page of the given PDF
    async fn recognize(&self, pdf: &[u8], language: &str) -> Result<Vec<OcrPage>, OcrError>;
}

/// Local tesseract pipeline
pub struct TesseractProvider {
    dpi: u32,
}

impl TesseractProvider {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    /// Rasterize the PDF to one PNG per page and return the image paths
    /// in page order.
    async fn rasterize(&self, pdf_path: &Path, prefix: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let output = Command::new("pdftoppm")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(prefix)
            .output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "pdftoppm failed: {}",
                stderr.trim()
            )));
        }

        collect_page_images(prefix).await
    }

    async fn recognize_page(
        &self,
        image: &Path,
        language: &str,
        number: usize,
    ) -> Result<OcrPage, OcrError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", language, "tsv"])
            .output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "tesseract failed on page {}: {}",
                number,
                stderr.trim()
            )));
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout), number)
    }
}

#[async_trait]
impl OcrProviderTrait for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        command_available("tesseract", "--version").await && command_available("pdftoppm", "-v").await
    }

    async fn recognize(&self, pdf: &[u8], language: &str) -> Result<Vec<OcrPage>, OcrError> {
        validate_language(language)?;

        let work_id = Uuid::new_v4();
        let temp_dir = std::env::temp_dir();
        let stem = format!("resaltar-{}", work_id);
        let pdf_path = temp_dir.join(format!("{}.pdf", stem));

        tokio::fs::write(&pdf_path, pdf)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("failed to write temp pdf: {}", e)))?;

        let rasterized = self.rasterize(&pdf_path, &temp_dir.join(&stem)).await;
        let _ = tokio::fs::remove_file(&pdf_path).await;
        let image_paths = rasterized?;

        tracing::debug!(pages = image_paths.len(), dpi = self.dpi, "rasterized document");

        let mut pages = Vec::with_capacity(image_paths.len());
        let mut failure = None;
        for (index, path) in image_paths.iter().enumerate() {
            match self.recognize_page(path, language, index + 1).await {
                Ok(page) => pages.push(page),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        for path in &image_paths {
            let _ = tokio::fs::remove_file(path).await;
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(pages),
        }
    }
}

/// OCR over HTTP, for deployments without local tesseract
pub struct RemoteOcrProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteOcrProvider {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct RemoteRequest<'a> {
    document: String,
    language: &'a str,
}

#[derive(Deserialize)]
struct RemoteResponse {
    pages: Vec<OcrPage>,
}

#[async_trait]
impl OcrProviderTrait for RemoteOcrProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Remote
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(self.url("health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn recognize(&self, pdf: &[u8], language: &str) -> Result<Vec<OcrPage>, OcrError> {
        validate_language(language)?;

        let request = RemoteRequest {
            document: BASE64_STANDARD.encode(pdf),
            language,
        };
        let response = self
            .client
            .post(self.url("recognize"))
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("remote ocr request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OcrError::ApiError(format!(
                "remote ocr returned {}",
                response.status()
            )));
        }

        let body: RemoteResponse = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidOutput(format!("remote ocr response: {}", e)))?;
        Ok(body.pages)
    }
}

/// Language codes are passed to subprocesses, so only accept the
/// characters tesseract language packs actually use.
fn validate_language(language: &str) -> Result<(), OcrError> {
    if language.is_empty()
        || !language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '_')
    {
        return Err(OcrError::ProcessingError(format!(
            "invalid language code: {}",
            language
        )));
    }
    Ok(())
}

async fn command_available(program: &str, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Find the `{stem}-N.png` files pdftoppm wrote next to the prefix,
/// sorted by page number. pdftoppm zero-pads N, so sort numerically.
async fn collect_page_images(prefix: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let dir = prefix.parent().unwrap_or(Path::new("."));
    let stem = prefix.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| OcrError::ProcessingError(format!("failed to list temp dir: {}", e)))?;

    let mut found: Vec<(u32, PathBuf)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| OcrError::ProcessingError(format!("failed to list temp dir: {}", e)))?
    {
        if let Some(name) = entry.file_name().to_str() {
            if let Some(number) = page_image_number(name, stem) {
                found.push((number, entry.path()));
            }
        }
    }

    if found.is_empty() {
        return Err(OcrError::InvalidOutput(
            "pdftoppm produced no page images".to_string(),
        ));
    }

    found.sort_by_key(|(number, _)| *number);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn page_image_number(file_name: &str, stem: &str) -> Option<u32> {
    file_name
        .strip_prefix(stem)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

/// Parse tesseract TSV output for a single page.
///
/// Level 1 rows carry the raster dimensions, level 3 rows open a
/// paragraph, level 4 rows open a line and level 5 rows are words. Block
/// rows (level 2) only group paragraphs and are skipped, as are lines and
/// paragraphs that end up with no words.
fn parse_tsv(tsv: &str, number: usize) -> Result<OcrPage, OcrError> {
    let mut dims: Option<PageDimensions> = None;
    let mut paragraphs: Vec<OcrParagraph> = Vec::new();
    let mut paragraph: Option<OcrParagraph> = None;
    let mut line: Option<OcrLine> = None;

    for row in tsv.lines() {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        let level = match fields[0].parse::<u32>() {
            Ok(level) => level,
            Err(_) => continue, // header row
        };
        let bbox = match parse_bbox(&fields) {
            Some(bbox) => bbox,
            None => {
                return Err(OcrError::InvalidOutput(format!("malformed tsv row: {}", row)));
            }
        };

        match level {
            1 => {
                dims = Some(PageDimensions {
                    width: bbox.right,
                    height: bbox.bottom,
                });
            }
            3 => {
                flush_line(&mut line, &mut paragraph);
                flush_paragraph(&mut paragraph, &mut paragraphs);
                paragraph = Some(OcrParagraph {
                    bbox,
                    lines: Vec::new(),
                });
            }
            4 => {
                flush_line(&mut line, &mut paragraph);
                line = Some(OcrLine {
                    bbox,
                    words: Vec::new(),
                });
            }
            5 => {
                let text = fields[11].trim();
                if text.is_empty() {
                    continue;
                }
                let confidence = fields[10].parse::<f64>().unwrap_or(0.0);
                if let Some(line) = line.as_mut() {
                    line.words.push(OcrWord {
                        text: text.to_string(),
                        confidence,
                        bbox,
                    });
                }
            }
            _ => {}
        }
    }
    flush_line(&mut line, &mut paragraph);
    flush_paragraph(&mut paragraph, &mut paragraphs);

    let dims = dims.ok_or_else(|| {
        OcrError::InvalidOutput(format!("tsv output for page {} has no page record", number))
    })?;

    Ok(OcrPage {
        number,
        dims,
        paragraphs,
    })
}

fn parse_bbox(fields: &[&str]) -> Option<BoundingBox> {
    let left = fields[6].parse::<f64>().ok()?;
    let top = fields[7].parse::<f64>().ok()?;
    let width = fields[8].parse::<f64>().ok()?;
    let height = fields[9].parse::<f64>().ok()?;
    Some(BoundingBox::new(left, top, left + width, top + height))
}

fn flush_line(line: &mut Option<OcrLine>, paragraph: &mut Option<OcrParagraph>) {
    if let Some(line) = line.take() {
        if line.words.is_empty() {
            return;
        }
        if let Some(paragraph) = paragraph.as_mut() {
            paragraph.lines.push(line);
        }
    }
}

fn flush_paragraph(paragraph: &mut Option<OcrParagraph>, paragraphs: &mut Vec<OcrParagraph>) {
    if let Some(paragraph) = paragraph.take() {
        if !paragraph.lines.is_empty() {
            paragraphs.push(paragraph);
        }
    }
}

/// Scripted provider for tests
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockProvider {
    pub provider: OcrProvider,
    pub pages: Vec<OcrPage>,
    pub unavailable: bool,
    pub fail: bool,
    pub delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
}

#[cfg(test)]
impl MockProvider {
    pub fn with_pages(pages: Vec<OcrPage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn provider_type(&self) -> OcrProvider {
        self.provider
    }

    async fn is_available(&self) -> bool {
        !self.unavailable
    }

    async fn recognize(&self, _pdf: &[u8], _language: &str) -> Result<Vec<OcrPage>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(OcrError::ProcessingError("mock provider failure".to_string()));
        }
        Ok(self.pages.clone())
    }
}

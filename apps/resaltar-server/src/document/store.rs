//! Document store
//!
//! Holds the single active document: original bytes, OCR result and the
//! most recent highlighted output. A generation counter ties recognition
//! results to the upload that started them, so results for a superseded
//! upload are silently discarded. Search and seek serialize on an
//! operation lock so two render passes never interleave; each pass
//! starts from the original bytes and replaces the highlighted output
//! wholesale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

use super::error::DocumentError;
use super::flatten::{flatten, max_position};
use super::highlighter::{draw_paragraph_highlight, draw_word_highlights};
use super::matcher::match_phrase;
use super::resolver::resolve_offset;
use crate::ocr::{OcrPage, OcrService};
use crate::pdf::DocumentRenderer;

/// Cap on one recognition run
const OCR_TIMEOUT_SECS: u64 = 300;
/// Cap on one highlight pass (load, draw, save)
const RENDER_TIMEOUT_SECS: u64 = 60;

/// Document lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    #[default]
    Idle,
    OcrPreprocessing,
    Ready,
}

#[derive(Default)]
struct DocumentSlot {
    status: DocumentStatus,
    original: Option<Bytes>,
    file_name: Option<String>,
    pages: Option<Arc<Vec<OcrPage>>>,
    highlighted: Option<Bytes>,
    generation: u64,
    ocr_duration_ms: Option<u64>,
    last_error: Option<String>,
}

/// Snapshot served by the status endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatusView {
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub matches: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekOutcome {
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    pub duration_ms: u64,
}

#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    ocr: Arc<OcrService>,
    renderer: Arc<dyn DocumentRenderer>,
    slot: RwLock<DocumentSlot>,
    op_lock: Mutex<()>,
}

impl DocumentStore {
    pub fn new(ocr: Arc<OcrService>, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                ocr,
                renderer,
                slot: RwLock::new(DocumentSlot::default()),
                op_lock: Mutex::new(()),
            }),
        }
    }

    /// Accept a new document. Any previous document, OCR result and
    /// highlighted output are dropped; returns the generation the caller
    /// should pass to [`run_recognition`](Self::run_recognition).
    pub async fn load_document(&self, file_name: String, bytes: Bytes) -> u64 {
        let size = bytes.len();
        let mut slot = self.inner.slot.write().await;
        slot.generation += 1;
        let generation = slot.generation;
        slot.status = DocumentStatus::OcrPreprocessing;
        slot.original = Some(bytes);
        slot.highlighted = None;
        slot.pages = None;
        slot.ocr_duration_ms = None;
        slot.last_error = None;
        tracing::info!(generation, file = %file_name, size, "document loaded, recognition queued");
        slot.file_name = Some(file_name);
        generation
    }

    /// Run recognition for one upload generation. Results arriving after
    /// a newer upload are dropped without touching the slot.
    pub async fn run_recognition(&self, generation: u64, bytes: Bytes) {
        let started = Instant::now();
        let result = match timeout(
            Duration::from_secs(OCR_TIMEOUT_SECS),
            self.inner.ocr.recognize(&bytes),
        )
        .await
        {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(DocumentError::Ocr(e)),
            Err(_) => Err(DocumentError::Timeout(OCR_TIMEOUT_SECS)),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut slot = self.inner.slot.write().await;
        if slot.generation != generation {
            tracing::debug!(
                generation,
                current = slot.generation,
                "discarding superseded recognition result"
            );
            return;
        }

        match result {
            Ok(pages) => {
                tracing::info!(generation, pages = pages.len(), duration_ms, "document ready");
                log_paragraph_offsets(&pages);
                slot.pages = Some(pages);
                slot.ocr_duration_ms = Some(duration_ms);
                slot.status = DocumentStatus::Ready;
            }
            Err(e) => {
                tracing::error!(generation, error = %e, "recognition failed");
                slot.status = DocumentStatus::Idle;
                slot.last_error = Some(e.to_string());
            }
        }
    }

    /// Highlight every occurrence of `phrase`.
    ///
    /// An empty phrase is a no-op that leaves the displayed document
    /// untouched. A phrase with zero matches still replaces the
    /// highlighted output with a fresh (unmarked) copy.
    pub async fn search(&self, phrase: &str) -> Result<SearchOutcome, DocumentError> {
        let _op = self.inner.op_lock.lock().await;

        let (original, pages, generation) = self.snapshot_ready().await?;
        if phrase.is_empty() {
            return Ok(SearchOutcome {
                matches: 0,
                duration_ms: 0,
            });
        }

        let started = Instant::now();
        let render = async {
            let mut handle = self.inner.renderer.load(&original).await?;
            let matches = match_phrase(&pages, phrase);
            let found = matches.len();
            draw_word_highlights(handle.as_mut(), &pages, &matches)?;
            let saved = handle.save().await?;
            Ok::<_, DocumentError>((found, saved))
        };
        let (found, saved) = timeout(Duration::from_secs(RENDER_TIMEOUT_SECS), render)
            .await
            .map_err(|_| DocumentError::Timeout(RENDER_TIMEOUT_SECS))??;

        self.store_highlighted(generation, Bytes::from(saved)).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(matches = found, duration_ms, "phrase search complete");
        Ok(SearchOutcome {
            matches: found,
            duration_ms,
        })
    }

    /// Highlight the paragraph owning the character offset `position`.
    ///
    /// A position at or beyond the end of the document text resolves to
    /// nothing; the displayed document is left as it was.
    pub async fn seek(&self, position: i64) -> Result<SeekOutcome, DocumentError> {
        let _op = self.inner.op_lock.lock().await;

        let (original, pages, generation) = self.snapshot_ready().await?;
        if position < 0 {
            return Err(DocumentError::InvalidPosition(position));
        }
        let position = position as usize;

        let started = Instant::now();
        let render = async {
            let mut handle = self.inner.renderer.load(&original).await?;
            let resolved = match resolve_offset(&pages, position) {
                Some(flat) => flat,
                None => {
                    tracing::debug!(
                        position,
                        max = max_position(&pages),
                        "position beyond document text"
                    );
                    return Ok::<_, DocumentError>(None);
                }
            };
            draw_paragraph_highlight(handle.as_mut(), &pages, &resolved)?;
            let saved = handle.save().await?;
            Ok(Some((resolved.page_index, resolved.start, resolved.end, saved)))
        };
        let outcome = timeout(Duration::from_secs(RENDER_TIMEOUT_SECS), render)
            .await
            .map_err(|_| DocumentError::Timeout(RENDER_TIMEOUT_SECS))??;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Some((page, start, end, saved)) => {
                self.store_highlighted(generation, Bytes::from(saved)).await;
                tracing::info!(position, page, duration_ms, "seek highlighted paragraph");
                Ok(SeekOutcome {
                    resolved: true,
                    page: Some(page),
                    start: Some(start),
                    end: Some(end),
                    duration_ms,
                })
            }
            None => Ok(SeekOutcome {
                resolved: false,
                page: None,
                start: None,
                end: None,
                duration_ms,
            }),
        }
    }

    /// Bytes the viewer displays: the highlighted output when one exists,
    /// the original otherwise.
    pub async fn displayed(&self) -> Result<Bytes, DocumentError> {
        let slot = self.inner.slot.read().await;
        match (&slot.highlighted, &slot.original) {
            (Some(bytes), _) => Ok(bytes.clone()),
            (None, Some(bytes)) => Ok(bytes.clone()),
            (None, None) => Err(DocumentError::NoDocumentLoaded),
        }
    }

    pub async fn status(&self) -> DocumentStatusView {
        let slot = self.inner.slot.read().await;
        DocumentStatusView {
            status: slot.status,
            file_name: slot.file_name.clone(),
            pages: slot.pages.as_ref().map(|pages| pages.len()),
            max_position: slot.pages.as_ref().map(|pages| max_position(pages)),
            ocr_duration_ms: slot.ocr_duration_ms,
            error: slot.last_error.clone(),
        }
    }

    async fn snapshot_ready(&self) -> Result<(Bytes, Arc<Vec<OcrPage>>, u64), DocumentError> {
        let slot = self.inner.slot.read().await;
        let original = slot
            .original
            .clone()
            .ok_or(DocumentError::NoDocumentLoaded)?;
        let pages = slot.pages.clone().ok_or(DocumentError::NoOcrResult)?;
        Ok((original, pages, slot.generation))
    }

    async fn store_highlighted(&self, generation: u64, bytes: Bytes) {
        let mut slot = self.inner.slot.write().await;
        if slot.generation != generation {
            tracing::debug!(
                generation,
                current = slot.generation,
                "discarding highlight for superseded document"
            );
            return;
        }
        slot.highlighted = Some(bytes);
    }
}

fn log_paragraph_offsets(pages: &[OcrPage]) {
    for par in flatten(pages) {
        tracing::debug!(
            page = par.page_index + 1,
            start = par.start,
            end = par.end,
            "paragraph offsets"
        );
    }
}

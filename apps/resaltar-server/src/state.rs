//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::document::DocumentStore;
use crate::ocr::OcrService;
use crate::pdf::{DocumentRenderer, LopdfRenderer};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    ocr: Arc<OcrService>,
    store: DocumentStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let ocr = Arc::new(OcrService::new(config.ocr.clone()));
        let renderer: Arc<dyn DocumentRenderer> = Arc::new(LopdfRenderer::new());
        Self::with_parts(config, ocr, renderer)
    }

    /// Assemble state around explicit collaborators. Tests use this to
    /// substitute scripted OCR providers and renderers.
    pub fn with_parts(
        config: Config,
        ocr: Arc<OcrService>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        let store = DocumentStore::new(ocr.clone(), renderer);
        Self {
            inner: Arc::new(AppStateInner { config, ocr, store }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn ocr(&self) -> &OcrService {
        &self.inner.ocr
    }

    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }
}

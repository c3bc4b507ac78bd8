//! OCR service
//!
//! Dispatches recognition to the configured providers: the preferred one
//! first, then any other that reports itself available. Results are kept
//! in the recognition memo so re-uploading a recent document is free.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::config::OcrConfig;

use super::memo::RecognitionMemo;
use super::provider::{OcrProviderTrait, RemoteOcrProvider, TesseractProvider};
use super::types::{OcrError, OcrPage, OcrProvider};

/// Availability of one provider, as reported on the health endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub provider: OcrProvider,
    pub available: bool,
}

pub struct OcrService {
    config: OcrConfig,
    providers: Vec<Arc<dyn OcrProviderTrait>>,
    memo: RecognitionMemo,
}

impl OcrService {
    pub fn new(config: OcrConfig) -> Self {
        let mut providers: Vec<Arc<dyn OcrProviderTrait>> =
            vec![Arc::new(TesseractProvider::new(config.dpi))];
        if let Some(endpoint) = config.remote_endpoint.clone() {
            providers.push(Arc::new(RemoteOcrProvider::new(endpoint)));
        }
        Self::with_providers(config, providers)
    }

    pub fn with_providers(config: OcrConfig, providers: Vec<Arc<dyn OcrProviderTrait>>) -> Self {
        Self {
            config,
            providers,
            memo: RecognitionMemo::new(),
        }
    }

    /// Recognize a document, consulting the memo first.
    pub async fn recognize(&self, pdf: &[u8]) -> Result<Arc<Vec<OcrPage>>, OcrError> {
        let fingerprint = RecognitionMemo::fingerprint(pdf);
        if let Some(pages) = self.memo.get(&fingerprint) {
            tracing::debug!(fingerprint = %&fingerprint[..12], "recognition memo hit");
            return Ok(pages);
        }

        let pages = Arc::new(self.recognize_uncached(pdf).await?);
        self.memo.insert(fingerprint, pages.clone());
        Ok(pages)
    }

    async fn recognize_uncached(&self, pdf: &[u8]) -> Result<Vec<OcrPage>, OcrError> {
        let mut ordered: Vec<&Arc<dyn OcrProviderTrait>> = self.providers.iter().collect();
        ordered.sort_by_key(|provider| provider.provider_type() != self.config.preferred_provider);

        let mut last_error = None;
        for provider in ordered {
            let provider_type = provider.provider_type();
            if !provider.is_available().await {
                tracing::warn!(provider = ?provider_type, "ocr provider unavailable, trying next");
                continue;
            }

            let started = Instant::now();
            match provider.recognize(pdf, &self.config.language).await {
                Ok(pages) => {
                    tracing::info!(
                        provider = ?provider_type,
                        pages = pages.len(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "ocr complete"
                    );
                    return Ok(pages);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = ?provider_type,
                        error = %e,
                        "ocr provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OcrError::ProviderNotAvailable("no ocr provider available".to_string())
        }))
    }

    /// Availability of every configured provider
    pub async fn provider_status(&self) -> Vec<ProviderStatus> {
        let mut statuses = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            statuses.push(ProviderStatus {
                provider: provider.provider_type(),
                available: provider.is_available().await,
            });
        }
        statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::provider::MockProvider;
    use crate::ocr::types::PageDimensions;

    fn page(number: usize) -> OcrPage {
        OcrPage {
            number,
            dims: PageDimensions {
                width: 1000.0,
                height: 1400.0,
            },
            paragraphs: Vec::new(),
        }
    }

    fn config() -> OcrConfig {
        OcrConfig {
            preferred_provider: OcrProvider::Tesseract,
            language: "eng".to_string(),
            dpi: 300,
            remote_endpoint: None,
        }
    }

    #[tokio::test]
    async fn test_preferred_provider_wins() {
        let tesseract = MockProvider {
            provider: OcrProvider::Tesseract,
            pages: vec![page(1)],
            ..MockProvider::default()
        };
        let remote = MockProvider {
            provider: OcrProvider::Remote,
            pages: vec![page(2)],
            ..MockProvider::default()
        };
        let service = OcrService::with_providers(
            config(),
            vec![Arc::new(remote.clone()), Arc::new(tesseract.clone())],
        );

        let pages = service.recognize(b"doc").await.unwrap();
        assert_eq!(pages[0].number, 1);
        assert_eq!(tesseract.call_count(), 1);
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_when_preferred_unavailable() {
        let tesseract = MockProvider {
            provider: OcrProvider::Tesseract,
            unavailable: true,
            ..MockProvider::default()
        };
        let remote = MockProvider {
            provider: OcrProvider::Remote,
            pages: vec![page(7)],
            ..MockProvider::default()
        };
        let service = OcrService::with_providers(
            config(),
            vec![Arc::new(tesseract.clone()), Arc::new(remote)],
        );

        let pages = service.recognize(b"doc").await.unwrap();
        assert_eq!(pages[0].number, 7);
        assert_eq!(tesseract.call_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_when_preferred_fails() {
        let tesseract = MockProvider {
            provider: OcrProvider::Tesseract,
            fail: true,
            ..MockProvider::default()
        };
        let remote = MockProvider {
            provider: OcrProvider::Remote,
            pages: vec![page(3)],
            ..MockProvider::default()
        };
        let service = OcrService::with_providers(
            config(),
            vec![Arc::new(tesseract.clone()), Arc::new(remote)],
        );

        let pages = service.recognize(b"doc").await.unwrap();
        assert_eq!(pages[0].number, 3);
        assert_eq!(tesseract.call_count(), 1);
    }

    #[tokio::test]
    async fn test_error_surfaces_when_every_provider_fails() {
        let provider = MockProvider {
            fail: true,
            ..MockProvider::default()
        };
        let service = OcrService::with_providers(config(), vec![Arc::new(provider)]);

        let err = service.recognize(b"doc").await.unwrap_err();
        assert!(matches!(err, OcrError::ProcessingError(_)));
    }

    #[tokio::test]
    async fn test_memo_skips_repeat_recognition() {
        let provider = MockProvider::with_pages(vec![page(1)]);
        let service = OcrService::with_providers(config(), vec![Arc::new(provider.clone())]);

        service.recognize(b"same bytes").await.unwrap();
        service.recognize(b"same bytes").await.unwrap();
        assert_eq!(provider.call_count(), 1);

        service.recognize(b"different bytes").await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }
}

//! Recognition memo
//!
//! OCR output keyed by a digest of the document bytes. Re-uploading a
//! recently seen document skips the recognition pass entirely. Entries
//! age out so a long-running server does not serve stale results forever.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::types::OcrPage;

/// How many recognition results are retained
const MEMO_CAPACITY: usize = 4;

/// How long an entry stays valid
const MEMO_MAX_AGE: Duration = Duration::from_secs(5 * 60);

struct MemoEntry {
    stored_at: Instant,
    pages: Arc<Vec<OcrPage>>,
}

#[derive(Clone)]
pub struct RecognitionMemo {
    entries: Arc<Mutex<LruCache<String, MemoEntry>>>,
}

impl RecognitionMemo {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(MEMO_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ))),
        }
    }

    /// Digest of the document bytes, used as the memo key
    pub fn fingerprint(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, fingerprint: &str) -> Option<Arc<Vec<OcrPage>>> {
        let mut entries = self.entries.lock();
        match entries.get(fingerprint) {
            Some(entry) if entry.stored_at.elapsed() < MEMO_MAX_AGE => Some(entry.pages.clone()),
            Some(_) => {
                entries.pop(fingerprint);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, fingerprint: String, pages: Arc<Vec<OcrPage>>) {
        self.entries.lock().put(
            fingerprint,
            MemoEntry {
                stored_at: Instant::now(),
                pages,
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl Default for RecognitionMemo {
    fn default() -> Self {
        Self::new()
    }
}

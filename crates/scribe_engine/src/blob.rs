use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use scribe_logging::scribe_debug;

const BLOB_SCHEME: &str = "blob:";

/// In-memory payload store handing out `blob:<n>` urls.
///
/// Whoever displays an artifact owns its url and must `revoke` it once the
/// artifact is no longer shown.
#[derive(Debug, Default)]
pub struct BlobStore {
    next_id: AtomicU64,
    blobs: Mutex<HashMap<u64, Bytes>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, payload: Bytes) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().insert(id, payload);
        format!("{BLOB_SCHEME}{id}")
    }

    pub fn get(&self, url: &str) -> Option<Bytes> {
        let id = parse_blob_url(url)?;
        self.lock().get(&id).cloned()
    }

    /// Frees the payload behind `url`. Returns false for unknown urls.
    pub fn revoke(&self, url: &str) -> bool {
        let Some(id) = parse_blob_url(url) else {
            return false;
        };
        let removed = self.lock().remove(&id).is_some();
        if removed {
            scribe_debug!("Revoked {}", url);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Bytes>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_blob_url(url: &str) -> Option<u64> {
    url.strip_prefix(BLOB_SCHEME)?.parse().ok()
}

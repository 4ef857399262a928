//! Pluggable cache for parsed results.
//!
//! The container parsers never touch a cache; [`MetadataExtractor`] consults
//! one around file-level extraction when the host wires it in. Hosts with
//! their own storage implement [`MetadataCache`]; [`LruMetadataCache`] is the
//! bounded in-memory default.
//!
//! [`MetadataExtractor`]: crate::extractor::MetadataExtractor

use crate::model::ParsedMetadata;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::Metadata;
use std::num::NonZeroUsize;
use std::time::UNIX_EPOCH;
use tracing::trace;

/// Identity of one parsed file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub file_name: String,
    pub size: u64,
    /// Last modification time, milliseconds since the Unix epoch
    pub modified_ms: Option<u64>,
    /// SHA-256 of the content, for inputs without a modification time
    pub content_hash: Option<String>,
}

impl CacheKey {
    pub fn new(file_name: impl Into<String>, size: u64, modified_ms: Option<u64>) -> Self {
        Self {
            file_name: file_name.into(),
            size,
            modified_ms,
            content_hash: None,
        }
    }

    /// Key from filesystem metadata (name + size + mtime).
    pub fn from_fs_metadata(file_name: impl Into<String>, metadata: &Metadata) -> Self {
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_millis() as u64);
        Self::new(file_name, metadata.len(), modified_ms)
    }

    /// Key from the bytes themselves.
    pub fn for_content(file_name: impl Into<String>, data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self {
            file_name: file_name.into(),
            size: data.len() as u64,
            modified_ms: None,
            content_hash: Some(format!("{:x}", hasher.finalize())),
        }
    }
}

/// Storage for parsed results, shared across tasks.
pub trait MetadataCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<ParsedMetadata>;

    fn set(&self, key: CacheKey, value: ParsedMetadata);
}

/// In-memory LRU cache bounded by entry count.
pub struct LruMetadataCache {
    entries: Mutex<LruCache<CacheKey, ParsedMetadata>>,
}

impl LruMetadataCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl MetadataCache for LruMetadataCache {
    fn get(&self, key: &CacheKey) -> Option<ParsedMetadata> {
        let hit = self.entries.lock().get(key).cloned();
        trace!(file = %key.file_name, hit = hit.is_some(), "Metadata cache lookup");
        hit
    }

    fn set(&self, key: CacheKey, value: ParsedMetadata) {
        self.entries.lock().put(key, value);
    }
}

impl std::fmt::Debug for LruMetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruMetadataCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

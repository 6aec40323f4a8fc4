//! Decoded-plane cache.
//!
//! Serving a region means decoding a whole plane first; interactive use
//! (thumbnails, repeated crops from one plane) would otherwise re-run the
//! base64/inflate pipeline for every request. This LRU cache keeps recently
//! decoded planes, keyed by series and plane index, with a byte budget
//! rather than an entry count since plane sizes vary wildly between files.
//!
//! A plane larger than the whole budget is served but never stored, so a
//! zero-budget cache disables caching outright.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use lru::LruCache;

/// Default cache budget: 64MB
pub const DEFAULT_PLANE_CACHE_CAPACITY: usize = 64 * 1024 * 1024;

/// Maximum number of entries (to bound LRU bookkeeping)
const MAX_ENTRIES: usize = 256;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for decoded planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneKey {
    /// Series index within the file
    pub series: usize,

    /// Plane index within the series
    pub plane: usize,
}

impl PlaneKey {
    pub fn new(series: usize, plane: usize) -> Self {
        Self { series, plane }
    }
}

// =============================================================================
// Plane Cache
// =============================================================================

/// LRU cache for decoded plane bytes with a size budget.
///
/// Thread-safe behind an internal mutex, so a reader shared between
/// threads keeps one coherent cache.
pub struct PlaneCache {
    inner: Mutex<Inner>,
    max_size: usize,
}

struct Inner {
    cache: LruCache<PlaneKey, Bytes>,
    current_size: usize,
}

impl PlaneCache {
    /// Create a cache with the default budget (64MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PLANE_CACHE_CAPACITY)
    }

    /// Create a cache with the given byte budget. A budget of zero
    /// disables caching.
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(NonZeroUsize::new(MAX_ENTRIES).unwrap()),
                current_size: 0,
            }),
            max_size,
        }
    }

    /// Get a plane, marking it recently used.
    pub fn get(&self, key: &PlaneKey) -> Option<Bytes> {
        let mut inner = self.lock();
        inner.cache.get(key).cloned()
    }

    /// Store a plane, evicting least-recently-used planes until the budget
    /// holds. Planes larger than the whole budget are not stored.
    pub fn put(&self, key: PlaneKey, data: Bytes) {
        if data.len() > self.max_size {
            return;
        }

        let mut inner = self.lock();

        // If the key exists, subtract the old size first.
        if let Some(old) = inner.cache.peek(&key) {
            inner.current_size = inner.current_size.saturating_sub(old.len());
        }

        inner.current_size += data.len();
        inner.cache.put(key, data);

        while inner.current_size > self.max_size {
            match inner.cache.pop_lru() {
                Some((_, evicted)) => {
                    inner.current_size = inner.current_size.saturating_sub(evicted.len());
                }
                None => break,
            }
        }
    }

    /// Drop every cached plane.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.cache.clear();
        inner.current_size = 0;
    }

    /// Number of cached planes.
    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cache.is_empty()
    }

    /// Total bytes currently held.
    pub fn size(&self) -> usize {
        self.lock().current_size
    }

    /// The byte budget.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PlaneCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaneCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("PlaneCache")
            .field("entries", &inner.cache.len())
            .field("size", &inner.current_size)
            .field("capacity", &self.max_size)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

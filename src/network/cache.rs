//! Page cache
//!
//! Maps request keys to fetched pages. Eviction is coarse: when an
//! insertion would push the cache past its capacity, everything is dropped
//! first. There is no LRU bookkeeping.

use super::Request;
use crate::engine::Page;
use crate::window::HistoryState;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Lifecycle of a cache record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Request issued, no response yet
    Fetching,
    /// Response parsed and stored
    Loaded,
    /// Transport failure or non-2xx response
    Error,
}

/// Cache entry for one request key
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub status: CacheStatus,
    /// Present once `status` is `Loaded`
    pub page: Option<Arc<Page>>,
    /// History state recorded when this page was displayed
    pub state: Option<HistoryState>,
}

impl CacheRecord {
    fn fetching() -> Self {
        Self {
            status: CacheStatus::Fetching,
            page: None,
            state: None,
        }
    }
}

/// Bounded page cache with full-clear eviction
#[derive(Clone)]
pub struct PageCache {
    /// Cached entries by request key
    entries: Arc<RwLock<HashMap<String, CacheRecord>>>,
    /// Maximum number of entries kept after an insertion
    capacity: usize,
}

impl PageCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Claim a slot for `request`.
    ///
    /// Returns false if a cacheable request is already cached or in flight.
    /// Otherwise applies the eviction policy, inserts a `Fetching` record and
    /// returns true; the caller is then responsible for issuing the request.
    pub fn begin(&self, request: &Request) -> bool {
        let key = request.key();
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };

        if request.is_cacheable() && entries.contains_key(&key) {
            return false;
        }

        entries.remove(&key);
        self.make_room(&mut entries);
        entries.insert(key, CacheRecord::fetching());
        true
    }

    /// Clear everything if one more entry would exceed the capacity
    fn make_room(&self, entries: &mut HashMap<String, CacheRecord>) {
        if entries.len() + 1 > self.capacity {
            log::debug!(
                "page cache over capacity ({} entries, capacity {}), clearing",
                entries.len(),
                self.capacity
            );
            entries.clear();
        }
    }

    /// Record for `key`, inserted as `Fetching` under the eviction policy if
    /// it was evicted while in flight
    fn slot<'a>(&self, entries: &'a mut HashMap<String, CacheRecord>, key: &str) -> &'a mut CacheRecord {
        if !entries.contains_key(key) {
            self.make_room(entries);
        }
        entries.entry(key.to_string()).or_insert_with(CacheRecord::fetching)
    }

    /// Record a successful fetch
    pub fn store_loaded(&self, key: &str, page: Page) {
        if let Ok(mut entries) = self.entries.write() {
            let record = self.slot(&mut entries, key);
            record.status = CacheStatus::Loaded;
            record.page = Some(Arc::new(page));
        }
    }

    /// Record a failed fetch
    pub fn store_error(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            let record = self.slot(&mut entries, key);
            record.status = CacheStatus::Error;
        }
    }

    /// Seed a loaded page without going through a fetch
    pub fn insert_loaded(&self, key: &str, page: Page, state: Option<HistoryState>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CacheRecord {
                    status: CacheStatus::Loaded,
                    page: Some(Arc::new(page)),
                    state,
                },
            );
        }
    }

    pub fn get(&self, key: &str) -> Option<CacheRecord> {
        self.entries.read().ok()?.get(key).cloned()
    }

    pub fn status(&self, key: &str) -> Option<CacheStatus> {
        self.entries.read().ok()?.get(key).map(|r| r.status)
    }

    pub fn page(&self, key: &str) -> Option<Arc<Page>> {
        self.entries.read().ok()?.get(key)?.page.clone()
    }

    pub fn state(&self, key: &str) -> Option<HistoryState> {
        self.entries.read().ok()?.get(key)?.state.clone()
    }

    /// Attach the history state a page was displayed with
    pub fn set_state(&self, key: &str, state: HistoryState) {
        if let Ok(mut entries) = self.entries.write() {
            if let Some(record) = entries.get_mut(key) {
                record.state = Some(state);
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    /// Remove one entry, or every entry when `key` is `None`.
    /// Removing a key that is not cached does nothing.
    pub fn clear(&self, key: Option<&str>) {
        if let Ok(mut entries) = self.entries.write() {
            match key {
                Some(key) => {
                    entries.remove(key);
                }
                None => entries.clear(),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            capacity: self.capacity,
            ..Default::default()
        };
        if let Ok(entries) = self.entries.read() {
            for record in entries.values() {
                match record.status {
                    CacheStatus::Fetching => stats.fetching += 1,
                    CacheStatus::Loaded => stats.loaded += 1,
                    CacheStatus::Error => stats.errors += 1,
                }
            }
        }
        stats
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub fetching: usize,
    pub loaded: usize,
    pub errors: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Total number of entries
    pub fn entries(&self) -> usize {
        self.fetching + self.loaded + self.errors
    }
}

//! TTL snapshot cache keyed by URL, bounded to a small number of entries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::model::Snapshot;

struct CacheEntry {
    snapshot: Arc<Snapshot>,
    stored_at: Instant,
}

/// URL-keyed snapshot cache.
///
/// Entries expire after the TTL (a zero TTL disables caching entirely); when
/// the cache is full the stalest entry is evicted.
pub struct SnapshotCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_urls: usize,
}

impl SnapshotCache {
    pub fn new(ttl: Duration, max_urls: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_urls: max_urls.max(1),
        }
    }

    pub fn get(&self, url: &str) -> Option<Arc<Snapshot>> {
        if let Some(entry) = self.entries.get(url) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(Arc::clone(&entry.snapshot));
            }
        }
        self.entries.remove(url);
        None
    }

    pub fn put(&self, url: String, snapshot: Arc<Snapshot>) {
        if !self.entries.contains_key(&url) && self.entries.len() >= self.max_urls {
            self.evict_stalest();
        }
        self.entries.insert(
            url,
            CacheEntry {
                snapshot,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_stalest(&self) {
        let stalest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.stored_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = stalest {
            self.entries.remove(&key);
        }
    }
}

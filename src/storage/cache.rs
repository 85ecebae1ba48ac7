// LRU cache in front of another document source

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use log::trace;

use super::{DocumentSource, SourceMetrics, SourceMetricsStats};
use crate::error::Result;

/// Keeps recently fetched pages so both sides of an item, or items that
/// share a page, read the file once. Misses are not cached.
pub struct CachedSource<S> {
    inner: S,
    cache: Option<Mutex<LruCache<String, Arc<str>>>>,
    metrics: SourceMetrics,
}

impl<S: DocumentSource> CachedSource<S> {
    /// A `capacity` of zero disables caching.
    pub fn new(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            metrics: SourceMetrics::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cached_pages(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.lock().len())
    }
}

impl<S: DocumentSource> DocumentSource for CachedSource<S> {
    fn fetch(&self, page_key: &str) -> Result<Option<Arc<str>>> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lock().get(page_key) {
                trace!("Cache hit for page {}", page_key);
                self.metrics.record_cache_hit();
                return Ok(Some(Arc::clone(hit)));
            }
        }

        let fetched = self.inner.fetch(page_key).map_err(|e| {
            self.metrics.record_failure();
            e
        })?;
        match &fetched {
            Some(markup) => {
                self.metrics.record_read(markup.len());
                if let Some(cache) = &self.cache {
                    cache.lock().put(page_key.to_string(), Arc::clone(markup));
                }
            }
            None => self.metrics.record_not_found(),
        }
        Ok(fetched)
    }

    fn describe(&self) -> String {
        format!("cached {}", self.inner.describe())
    }

    fn metrics(&self) -> Option<SourceMetricsStats> {
        Some(self.metrics.get_stats())
    }
}

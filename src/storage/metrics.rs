use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use log::trace;

/// Read counters for a document source
#[derive(Debug)]
pub struct SourceMetrics {
    reads: AtomicU64,
    cache_hits: AtomicU64,
    not_found: AtomicU64,
    failed_reads: AtomicU64,
    bytes_read: AtomicU64,
    start_time: Instant,
}

impl Default for SourceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceMetrics {
    pub fn new() -> Self {
        Self {
            reads: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            failed_reads: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_read(&self, bytes: usize) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_reads.fetch_add(1, Ordering::Relaxed);
        trace!("Failed read recorded. Total failures: {}", self.failed_reads.load(Ordering::Relaxed));
    }

    pub fn get_stats(&self) -> SourceMetricsStats {
        SourceMetricsStats {
            reads: self.reads.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failed_reads: self.failed_reads.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMetricsStats {
    pub reads: u64,
    pub cache_hits: u64,
    pub not_found: u64,
    pub failed_reads: u64,
    pub bytes_read: u64,
    pub uptime_seconds: u64,
}

impl SourceMetricsStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.reads + self.cache_hits;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

//! Buffer pool statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Statistics for buffer pool monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BufferPoolStats {
    /// Acquires served from an available buffer
    pub hits: u64,
    /// Acquires that went to the native allocator
    pub misses: u64,
    /// Native allocations that failed
    pub allocation_failures: u64,
    /// Releases that kept the buffer for reuse
    pub releases_retained: u64,
    /// Releases that freed the native region
    pub releases_freed: u64,
    /// Releases of buffers this pool did not have outstanding
    pub unknown_releases: u64,
    /// Native frees issued by the pool (release, shrink, drop)
    pub native_frees: u64,
    /// Buffers currently held by callers
    pub currently_outstanding: usize,
    /// Peak number of buffers held by callers simultaneously
    pub peak_outstanding: usize,
    /// Buffers currently available for reuse
    pub currently_available: usize,
}

impl BufferPoolStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Default::default()
    }

    /// Native regions currently owned by the pool or its callers
    pub fn live_allocations(&self) -> usize {
        self.currently_outstanding + self.currently_available
    }

    /// Fraction of acquires served without a native allocation (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "BufferPoolStats {{ hits: {}, misses: {}, failures: {}, retained: {}, freed: {}, \
             unknown: {}, outstanding: {}, available: {}, peak: {}, hit_rate: {:.2}% }}",
            self.hits,
            self.misses,
            self.allocation_failures,
            self.releases_retained,
            self.releases_freed,
            self.unknown_releases,
            self.currently_outstanding,
            self.currently_available,
            self.peak_outstanding,
            self.hit_rate() * 100.0
        )
    }

    pub(crate) fn record_outstanding(&mut self, outstanding: usize) {
        self.currently_outstanding = outstanding;
        if outstanding > self.peak_outstanding {
            self.peak_outstanding = outstanding;
        }
    }
}

/// Helper for generating buffer sequence numbers
pub fn next_buffer_sequence() -> u64 {
    static SEQUENCE_COUNTER: AtomicU64 = AtomicU64::new(1);
    SEQUENCE_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Helper for generating pool identifiers
pub(crate) fn next_pool_id() -> u64 {
    static POOL_COUNTER: AtomicU64 = AtomicU64::new(1);
    POOL_COUNTER.fetch_add(1, Ordering::SeqCst)
}

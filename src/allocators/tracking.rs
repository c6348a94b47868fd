//! Instrumented allocator wrapper
//!
//! Wraps another [`NativeAllocator`] and records every call made through it.
//! Useful for asserting pool behaviour (how many regions are live, whether a
//! region was freed twice) and for injecting allocation failures.

use std::{
    collections::HashSet,
    ptr::NonNull,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use super::{system::SystemAllocator, traits::NativeAllocator};

/// Snapshot of the calls observed by a [`TrackingAllocator`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    /// Successful allocations
    pub allocations: u64,
    /// Allocation requests that were refused
    pub failed_allocations: u64,
    /// Frees forwarded to the inner allocator
    pub frees: u64,
    /// Frees of an address that was not live (double or foreign frees)
    pub invalid_frees: u64,
    /// Regions currently allocated
    pub live: usize,
    /// Bytes currently allocated
    pub live_bytes: usize,
}

/// Allocator wrapper that counts calls and can be told to fail
#[derive(Debug)]
pub struct TrackingAllocator<A: NativeAllocator = SystemAllocator> {
    inner: A,
    live: Mutex<HashSet<usize>>,
    live_bytes: AtomicUsize,
    allocations: AtomicU64,
    failed_allocations: AtomicU64,
    frees: AtomicU64,
    invalid_frees: AtomicU64,
    /// Number of upcoming allocations to refuse
    pending_failures: AtomicUsize,
    /// Refuse allocations while this many regions are live (0 = unlimited)
    live_limit: AtomicUsize,
}

impl TrackingAllocator<SystemAllocator> {
    /// Track calls against the system allocator
    pub fn new() -> Self {
        Self::wrap(SystemAllocator::new())
    }
}

impl Default for TrackingAllocator<SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: NativeAllocator> TrackingAllocator<A> {
    /// Track calls against an arbitrary allocator
    pub fn wrap(inner: A) -> Self {
        Self {
            inner,
            live: Mutex::new(HashSet::new()),
            live_bytes: AtomicUsize::new(0),
            allocations: AtomicU64::new(0),
            failed_allocations: AtomicU64::new(0),
            frees: AtomicU64::new(0),
            invalid_frees: AtomicU64::new(0),
            pending_failures: AtomicUsize::new(0),
            live_limit: AtomicUsize::new(0),
        }
    }

    /// Refuse the next `count` allocation requests
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Refuse allocations once `limit` regions are live. `0` lifts the limit.
    pub fn set_live_limit(&self, limit: usize) {
        self.live_limit.store(limit, Ordering::SeqCst);
    }

    /// Number of regions currently allocated
    pub fn live(&self) -> usize {
        self.live.lock().len()
    }

    /// Whether `addr` is a region this allocator handed out and has not freed
    pub fn is_live(&self, addr: usize) -> bool {
        self.live.lock().contains(&addr)
    }

    /// Get current statistics snapshot
    pub fn stats(&self) -> TrackingStats {
        TrackingStats {
            allocations: self.allocations.load(Ordering::SeqCst),
            failed_allocations: self.failed_allocations.load(Ordering::SeqCst),
            frees: self.frees.load(Ordering::SeqCst),
            invalid_frees: self.invalid_frees.load(Ordering::SeqCst),
            live: self.live(),
            live_bytes: self.live_bytes.load(Ordering::SeqCst),
        }
    }

    fn should_fail(&self, live: usize) -> bool {
        let limit = self.live_limit.load(Ordering::SeqCst);
        if limit != 0 && live >= limit {
            return true;
        }
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

// SAFETY: regions come straight from `inner`, which upholds the contract; the
// wrapper owns `inner`, so they live as long as the wrapper does.
unsafe impl<A: NativeAllocator> NativeAllocator for TrackingAllocator<A> {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let mut live = self.live.lock();
        if self.should_fail(live.len()) {
            self.failed_allocations.fetch_add(1, Ordering::SeqCst);
            return None;
        }

        match self.inner.allocate(size) {
            Some(ptr) => {
                live.insert(ptr.as_ptr() as usize);
                self.live_bytes.fetch_add(size, Ordering::SeqCst);
                self.allocations.fetch_add(1, Ordering::SeqCst);
                Some(ptr)
            }
            None => {
                self.failed_allocations.fetch_add(1, Ordering::SeqCst);
                None
            }
        }
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize) {
        let mut live = self.live.lock();
        if !live.remove(&(ptr.as_ptr() as usize)) {
            // Never forward a region we did not hand out, or already took back.
            self.invalid_frees.fetch_add(1, Ordering::SeqCst);
            log::error!("free of non-live region {:p} ({} bytes)", ptr.as_ptr(), size);
            return;
        }
        self.inner.free(ptr, size);
        self.live_bytes.fetch_sub(size, Ordering::SeqCst);
        self.frees.fetch_add(1, Ordering::SeqCst);
    }

    fn type_name(&self) -> &'static str {
        "TrackingAllocator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_allocations_and_frees() {
        let allocator = TrackingAllocator::new();
        let a = allocator.allocate(64).unwrap();
        let b = allocator.allocate(32).unwrap();

        let stats = allocator.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.live, 2);
        assert_eq!(stats.live_bytes, 96);

        unsafe {
            allocator.free(a, 64);
            allocator.free(b, 32);
        }
        let stats = allocator.stats();
        assert_eq!(stats.frees, 2);
        assert_eq!(stats.live, 0);
        assert_eq!(stats.live_bytes, 0);
    }

    #[test]
    fn test_double_free_is_recorded_not_forwarded() {
        let allocator = TrackingAllocator::new();
        let a = allocator.allocate(16).unwrap();
        unsafe {
            allocator.free(a, 16);
            allocator.free(a, 16);
        }
        let stats = allocator.stats();
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.invalid_frees, 1);
    }

    #[test]
    fn test_failure_injection() {
        let allocator = TrackingAllocator::new();
        allocator.fail_next(2);
        assert!(allocator.allocate(8).is_none());
        assert!(allocator.allocate(8).is_none());
        let ptr = allocator.allocate(8).unwrap();
        assert_eq!(allocator.stats().failed_allocations, 2);
        unsafe { allocator.free(ptr, 8) };
    }

    #[test]
    fn test_live_limit() {
        let allocator = TrackingAllocator::new();
        allocator.set_live_limit(1);
        let ptr = allocator.allocate(8).unwrap();
        assert!(allocator.allocate(8).is_none());
        unsafe { allocator.free(ptr, 8) };
        let ptr = allocator.allocate(8).unwrap();
        unsafe { allocator.free(ptr, 8) };
    }
}

//! Concurrent stress tests for the shared pool
//! Many threads acquire and release against one pool; the bookkeeping must
//! stay consistent with what the allocator actually saw.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use directbuf::{BufferPool, BufferPoolConfig, ReleaseOutcome, TrackingAllocator};

#[cfg(test)]
mod concurrent_stress_tests {
    use super::*;

    /// Test: mixed acquire/release under contention
    #[test]
    fn stress_acquire_release_contention() {
        let allocator = Arc::new(TrackingAllocator::new());
        let config = BufferPoolConfig::new("stress").with_capacity_limit(4);
        let pool = Arc::new(BufferPool::with_allocator(config, allocator.clone()).unwrap());

        let thread_count = 8;
        let operations_per_thread = 200;
        let barrier = Arc::new(Barrier::new(thread_count));
        let bad_contents = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for thread_id in 0..thread_count {
            let pool = pool.clone();
            let barrier = barrier.clone();
            let bad_contents = bad_contents.clone();

            handles.push(thread::spawn(move || {
                barrier.wait();
                for i in 0..operations_per_thread {
                    let size = 32 + (thread_id * 7 + i) % 96;
                    let mut buffer = pool.acquire(size).unwrap();
                    assert!(buffer.capacity() >= size);

                    let marker = [thread_id as u8; 16];
                    buffer.write(0, &marker).unwrap();
                    thread::yield_now();
                    if buffer.read(0, 16).unwrap() != marker {
                        bad_contents.fetch_add(1, Ordering::Relaxed);
                    }

                    assert_ne!(pool.release(buffer), ReleaseOutcome::Unknown);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // No two threads ever shared a region.
        assert_eq!(bad_contents.load(Ordering::Relaxed), 0);
        assert_eq!(pool.outstanding_count(), 0);
        assert!(pool.available_count() <= 4);
        assert!(pool.audit_leaks().is_clean());

        let alloc_stats = allocator.stats();
        assert_eq!(alloc_stats.invalid_frees, 0);
        assert_eq!(alloc_stats.live, pool.available_count());

        let stats = pool.stats();
        assert_eq!(
            stats.hits + stats.misses,
            (thread_count * operations_per_thread) as u64
        );
        assert_eq!(stats.misses, alloc_stats.allocations);
    }

    /// Test: live allocations stay within limit + outstanding while threads hold buffers
    #[test]
    fn stress_live_allocations_bounded() {
        let limit = 3;
        let allocator = Arc::new(TrackingAllocator::new());
        let config = BufferPoolConfig::new("bounded").with_capacity_limit(limit);
        let pool = Arc::new(BufferPool::with_allocator(config, allocator.clone()).unwrap());

        let thread_count = 6;
        let barrier = Arc::new(Barrier::new(thread_count));
        let mut handles = Vec::new();

        for _ in 0..thread_count {
            let pool = pool.clone();
            let allocator = allocator.clone();
            let barrier = barrier.clone();

            handles.push(thread::spawn(move || {
                barrier.wait();
                for round in 0..50 {
                    let held: Vec<_> = (0..(round % 3) + 1)
                        .map(|_| pool.acquire(64).unwrap())
                        .collect();
                    // Other threads' buffers count as outstanding too, and
                    // allocations and frees happen under the pool lock, so
                    // compare against the pool's own snapshot.
                    let stats = pool.stats();
                    assert!(stats.live_allocations() <= limit + stats.currently_outstanding);
                    assert!(allocator.live() <= limit + thread_count * 3);
                    for buffer in held {
                        pool.release(buffer);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(allocator.live(), pool.available_count());
        assert!(pool.available_count() <= limit);
    }
}

//! Pooled buffer manager
//!
//! Every native region the pool knows about is in exactly one of two maps:
//! `outstanding` while a caller holds its [`PooledBuffer`], `available` while
//! it waits for reuse. Regions leave both maps only when they are freed, so a
//! region can never be freed twice or handed out twice.
//!
//! ```text
//!   acquire (miss) ──► Outstanding ──release, available < limit──► Available
//!                          ▲                                           │
//!                          └──────────────── acquire (hit) ◄───────────┘
//!   Outstanding ──release, available >= limit──► Freed
//! ```

use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::SystemTime,
};

use parking_lot::Mutex;

use crate::{
    allocators::{BufferHandle, NativeAllocator, SystemAllocator},
    error::{DirectBufError, Result},
    leaks::{LeakReport, LeakReporter, LeakedBuffer, LogLeakReporter},
};

use super::{
    buffer::PooledBuffer,
    config::{BufferPoolConfig, SelectionPolicy},
    stats::{next_buffer_sequence, next_pool_id, BufferPoolStats},
};

/// What `release` did with a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Kept in the pool for reuse
    Retained,
    /// Native region returned to the allocator
    Freed,
    /// The buffer was not outstanding in this pool; nothing changed
    Unknown,
}

/// A tracked native region
#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: BufferHandle,
    capacity: usize,
    /// Sequence of the most recent acquire
    sequence: u64,
    acquired_at: SystemTime,
}

#[derive(Debug, Default)]
struct PoolState {
    available: HashMap<BufferHandle, Entry>,
    outstanding: HashMap<BufferHandle, Entry>,
    stats: BufferPoolStats,
}

impl PoolState {
    /// Find an available entry with at least `size` bytes
    fn select(&self, size: usize, policy: SelectionPolicy) -> Option<BufferHandle> {
        let mut fits = self.available.values().filter(|e| e.capacity >= size);
        let chosen = match policy {
            SelectionPolicy::SmallestFit => fits.min_by_key(|e| (e.capacity, e.sequence)),
            SelectionPolicy::FirstFit => fits.next(),
        };
        chosen.map(|e| e.handle)
    }

    fn sync_counts(&mut self) {
        let outstanding = self.outstanding.len();
        self.stats.record_outstanding(outstanding);
        self.stats.currently_available = self.available.len();
    }
}

/// A pool of reusable native buffers
pub struct BufferPool {
    /// Distinguishes buffers issued by different pools
    id: u64,
    config: BufferPoolConfig,
    allocator: Arc<dyn NativeAllocator>,
    reporter: Arc<dyn LeakReporter>,
    /// Available and outstanding maps; also serializes allocator calls
    state: Mutex<PoolState>,
}

impl BufferPool {
    /// Create a pool over the system allocator
    pub fn new(config: BufferPoolConfig) -> Result<Self> {
        Self::with_allocator(config, Arc::new(SystemAllocator::new()))
    }

    /// Create a pool over a caller-supplied allocator
    pub fn with_allocator(config: BufferPoolConfig, allocator: Arc<dyn NativeAllocator>) -> Result<Self> {
        config.validate()?;

        log::debug!(
            "creating buffer pool '{}' (capacity limit {}, {:?}, allocator {})",
            config.name,
            config.capacity_limit,
            config.selection,
            allocator.type_name()
        );

        Ok(Self {
            id: next_pool_id(),
            config,
            allocator,
            reporter: Arc::new(LogLeakReporter),
            state: Mutex::new(PoolState::default()),
        })
    }

    /// Send leak audits to `reporter` instead of the log
    pub fn with_reporter(mut self, reporter: Arc<dyn LeakReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Get a buffer with at least `size` bytes of capacity.
    ///
    /// Reuses an available buffer when one is large enough, picked according
    /// to the configured [`SelectionPolicy`]; the scan is linear in the number
    /// of available buffers. Otherwise allocates a new region of exactly
    /// `size` bytes. The returned buffer is empty (`len() == 0`).
    pub fn acquire(&self, size: usize) -> Result<PooledBuffer> {
        self.config.check_request(size)?;

        let mut state = self.state.lock();
        let sequence = next_buffer_sequence();
        let now = SystemTime::now();

        if let Some(handle) = state.select(size, self.config.selection) {
            if let Some(mut entry) = state.available.remove(&handle) {
                entry.sequence = sequence;
                entry.acquired_at = now;
                state.outstanding.insert(handle, entry);
                state.stats.hits += 1;
                state.sync_counts();
                drop(state);

                log::debug!(
                    "pool '{}': reusing {} ({} bytes) for request of {}",
                    self.config.name,
                    handle,
                    entry.capacity,
                    size
                );

                let mut buffer = PooledBuffer::new(
                    handle,
                    entry.capacity,
                    self.id,
                    sequence,
                    self.allocator.clone(),
                );
                if self.config.zero_on_reuse {
                    buffer.zero();
                }
                return Ok(buffer);
            }
        }

        let Some(ptr) = self.allocator.allocate(size) else {
            state.stats.allocation_failures += 1;
            drop(state);
            log::debug!("pool '{}': native allocation of {} bytes failed", self.config.name, size);
            return Err(DirectBufError::out_of_memory(size));
        };

        // SAFETY: `NativeAllocator` guarantees `size` writable bytes.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, size) };

        let handle = BufferHandle::new(ptr);
        debug_assert!(
            !state.available.contains_key(&handle) && !state.outstanding.contains_key(&handle),
            "allocator returned a region that is still tracked"
        );

        state.outstanding.insert(
            handle,
            Entry {
                handle,
                capacity: size,
                sequence,
                acquired_at: now,
            },
        );
        state.stats.misses += 1;
        state.sync_counts();
        drop(state);

        log::debug!("pool '{}': allocated {} ({} bytes)", self.config.name, handle, size);

        Ok(PooledBuffer::new(handle, size, self.id, sequence, self.allocator.clone()))
    }

    /// Give a buffer back.
    ///
    /// If fewer than `capacity_limit` buffers are available the buffer is
    /// kept for reuse, otherwise its region is freed. A buffer that is not
    /// outstanding in this pool is ignored and reported as
    /// [`ReleaseOutcome::Unknown`].
    pub fn release(&self, buffer: PooledBuffer) -> ReleaseOutcome {
        let handle = buffer.handle();
        let mut state = self.state.lock();

        let entry = if buffer.pool_id() == self.id {
            state.outstanding.remove(&handle)
        } else {
            None
        };

        let Some(entry) = entry else {
            state.stats.unknown_releases += 1;
            drop(state);
            log::debug!(
                "pool '{}': ignoring release of unknown buffer {} (issued by pool {})",
                self.config.name,
                handle,
                buffer.pool_id()
            );
            return ReleaseOutcome::Unknown;
        };

        let outcome = if state.available.len() < self.config.capacity_limit {
            state.available.insert(handle, entry);
            state.stats.releases_retained += 1;
            ReleaseOutcome::Retained
        } else {
            // SAFETY: the entry was just removed from tracking, so this is the
            // only free of a region the allocator handed us.
            unsafe { self.allocator.free(handle.as_non_null(), entry.capacity) };
            state.stats.releases_freed += 1;
            state.stats.native_frees += 1;
            ReleaseOutcome::Freed
        };
        state.sync_counts();
        drop(state);

        log::debug!(
            "pool '{}': release of {} ({} bytes) -> {:?}",
            self.config.name,
            handle,
            entry.capacity,
            outcome
        );
        outcome
    }

    /// Like [`release`](Self::release), but an unknown buffer is an error
    pub fn try_release(&self, buffer: PooledBuffer) -> Result<ReleaseOutcome> {
        let addr = buffer.handle().addr();
        match self.release(buffer) {
            ReleaseOutcome::Unknown => {
                log::warn!("pool '{}': release of unknown buffer {:#x}", self.config.name, addr);
                Err(DirectBufError::unknown_buffer(addr))
            }
            outcome => Ok(outcome),
        }
    }

    /// Report every buffer that is acquired but not yet released.
    ///
    /// Takes a consistent snapshot, hands it to the configured
    /// [`LeakReporter`] and returns it. Never frees or moves anything.
    pub fn audit_leaks(&self) -> LeakReport {
        let entries = {
            let state = self.state.lock();
            state
                .outstanding
                .values()
                .map(|e| LeakedBuffer::new(e.handle, e.capacity, e.sequence, e.acquired_at))
                .collect()
        };
        let report = LeakReport::new(self.config.name.clone(), entries);

        if report.is_clean() {
            self.reporter.report_clean(&report.pool);
        } else {
            self.reporter.report_leaks(&report);
        }
        report
    }

    /// Free available buffers until at most `target_available` remain.
    ///
    /// Largest regions go first. Returns the number of regions freed.
    pub fn shrink(&self, target_available: usize) -> usize {
        let mut state = self.state.lock();
        let current = state.available.len();
        if current <= target_available {
            return 0;
        }

        let mut victims: Vec<Entry> = state.available.values().copied().collect();
        victims.sort_by(|a, b| b.capacity.cmp(&a.capacity));
        victims.truncate(current - target_available);

        for entry in &victims {
            state.available.remove(&entry.handle);
            // SAFETY: removed from tracking above; freed exactly once.
            unsafe { self.allocator.free(entry.handle.as_non_null(), entry.capacity) };
        }
        let removed = victims.len();
        state.stats.native_frees += removed as u64;
        state.sync_counts();
        drop(state);

        log::debug!("pool '{}': shrink freed {} buffer(s)", self.config.name, removed);
        removed
    }

    /// Free every available buffer
    pub fn purge(&self) -> usize {
        self.shrink(0)
    }

    /// Get current statistics
    pub fn stats(&self) -> BufferPoolStats {
        self.state.lock().stats.clone()
    }

    /// Get pool configuration
    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    /// Identifier stamped on every buffer this pool issues
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get number of buffers available for reuse
    pub fn available_count(&self) -> usize {
        self.state.lock().available.len()
    }

    /// Get number of buffers held by callers
    pub fn outstanding_count(&self) -> usize {
        self.state.lock().outstanding.len()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BufferPool")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("allocator", &self.allocator.type_name())
            .field("available", &state.available.len())
            .field("outstanding", &state.outstanding.len())
            .finish()
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (handle, entry) in state.available.drain() {
            // SAFETY: available regions have no live view and are tracked once.
            unsafe { self.allocator.free(handle.as_non_null(), entry.capacity) };
        }
        // Outstanding regions may still be in use through a live view, which
        // holds its own reference to the allocator.
        if !state.outstanding.is_empty() {
            log::warn!(
                "pool '{}' dropped with {} buffer(s) still outstanding; their regions are not freed",
                self.config.name,
                state.outstanding.len()
            );
        }
    }
}

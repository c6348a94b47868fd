//! Native allocator trait and handle definition

use std::{fmt, ptr::NonNull};

/// Opaque identifier for a native memory region.
///
/// Handles are compared and hashed by address only. The pool never
/// dereferences a handle; the caller-facing [`PooledBuffer`] does.
///
/// [`PooledBuffer`]: crate::buffers::PooledBuffer
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(NonNull<u8>);

impl BufferHandle {
    /// Wrap a region pointer returned by a [`NativeAllocator`]
    pub fn new(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }

    /// Region address, for diagnostics and leak reports
    pub fn addr(&self) -> usize {
        self.0.as_ptr() as usize
    }

    pub(crate) fn as_non_null(&self) -> NonNull<u8> {
        self.0
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferHandle({:#x})", self.addr())
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.addr())
    }
}

// The handle is an address token; ownership of the region is tracked by the pool.
unsafe impl Send for BufferHandle {}
unsafe impl Sync for BufferHandle {}

/// The raw allocate/free pair the pool sits on top of.
///
/// Implementations need not be thread-safe internally: a [`BufferPool`] only
/// calls its allocator while holding its own state lock.
///
/// # Safety
///
/// [`PooledBuffer`] hands out safe slices over allocated regions, so an
/// implementation must guarantee that a region returned by `allocate(size)`:
///
/// - is valid for reads and writes of `size` bytes,
/// - does not overlap any other region that has not been freed,
/// - stays valid until it is passed to `free`, for as long as the allocator
///   value itself is alive. Dropping the allocator may reclaim regions that
///   were never freed; every buffer keeps its pool's allocator alive.
///
/// [`BufferPool`]: crate::buffers::BufferPool
/// [`PooledBuffer`]: crate::buffers::PooledBuffer
pub unsafe trait NativeAllocator: Send + Sync + fmt::Debug {
    /// Allocate a region of exactly `size` bytes. `None` signals failure.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Return a region to the allocator.
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate(size)` on this allocator and
    /// must not have been freed since.
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize);

    /// Get allocator type name for debugging
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

//! libc-backed native allocator

use std::ptr::NonNull;

use super::traits::NativeAllocator;

/// Native allocator backed by the C heap (`malloc`/`free`).
///
/// Regions are aligned to the platform's `max_align_t`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl SystemAllocator {
    pub fn new() -> Self {
        Self
    }
}

// SAFETY: malloc returns distinct regions of at least `size` bytes that stay
// valid until passed to free, independent of this zero-sized value.
unsafe impl NativeAllocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        // SAFETY: malloc has no preconditions; a null return is mapped to None.
        let ptr = unsafe { libc::malloc(size) } as *mut u8;
        NonNull::new(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, _size: usize) {
        libc::free(ptr.as_ptr() as *mut libc::c_void);
    }
}

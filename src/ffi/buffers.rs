//! FFI functions for buffer management

use crate::{buffers::ReleaseOutcome, global};

use super::{types::*, utils::HANDLE_REGISTRY};

/// Acquire a buffer of at least `size` bytes from the global pool
#[no_mangle]
pub extern "C" fn directbuf_acquire(
    size: usize,
    buffer_handle: *mut DirectBufBufferHandle,
) -> DirectBufErrorCode {
    if buffer_handle.is_null() {
        return DirectBufErrorCode::InvalidParameter;
    }

    match global::acquire(size) {
        Ok(buffer) => {
            let id = HANDLE_REGISTRY.lock().store_buffer(buffer);
            unsafe {
                *buffer_handle = id as DirectBufBufferHandle;
            }
            DirectBufErrorCode::Success
        }
        Err(e) => e.into(),
    }
}

/// Pointer to the start of a buffer's region, or null for an unknown handle
#[no_mangle]
pub extern "C" fn directbuf_buffer_data(buffer: DirectBufBufferHandle) -> *mut u8 {
    let mut registry = HANDLE_REGISTRY.lock();
    match registry.buffers.get_mut(&(buffer as usize)) {
        Some(buf) => buf.as_mut_ptr(),
        None => std::ptr::null_mut(),
    }
}

/// Capacity of a buffer, or 0 for an unknown handle
#[no_mangle]
pub extern "C" fn directbuf_buffer_capacity(buffer: DirectBufBufferHandle) -> usize {
    let registry = HANDLE_REGISTRY.lock();
    registry
        .buffers
        .get(&(buffer as usize))
        .map_or(0, |buf| buf.capacity())
}

/// Record how many bytes the C side has written
#[no_mangle]
pub extern "C" fn directbuf_buffer_set_len(
    buffer: DirectBufBufferHandle,
    len: usize,
) -> DirectBufErrorCode {
    let mut registry = HANDLE_REGISTRY.lock();
    match registry.buffers.get_mut(&(buffer as usize)) {
        Some(buf) => match buf.set_len(len) {
            Ok(()) => DirectBufErrorCode::Success,
            Err(e) => e.into(),
        },
        None => DirectBufErrorCode::UnknownBuffer,
    }
}

/// Get buffer information
#[no_mangle]
pub extern "C" fn directbuf_buffer_info(
    buffer: DirectBufBufferHandle,
    info: *mut DirectBufBufferInfo,
) -> DirectBufErrorCode {
    if info.is_null() {
        return DirectBufErrorCode::InvalidParameter;
    }

    let mut registry = HANDLE_REGISTRY.lock();
    let buf = match registry.buffers.get_mut(&(buffer as usize)) {
        Some(buf) => buf,
        None => return DirectBufErrorCode::UnknownBuffer,
    };

    unsafe {
        (*info).data = buf.as_mut_ptr();
        (*info).len = buf.len();
        (*info).capacity = buf.capacity();
        (*info).sequence = buf.sequence();
    }

    DirectBufErrorCode::Success
}

/// Release a buffer back to the global pool. The handle is invalid afterwards.
#[no_mangle]
pub extern "C" fn directbuf_release(buffer: DirectBufBufferHandle) -> DirectBufErrorCode {
    let taken = HANDLE_REGISTRY.lock().take_buffer(buffer as usize);
    let buf = match taken {
        Some(buf) => buf,
        None => return DirectBufErrorCode::UnknownBuffer,
    };

    match global::release(buf) {
        ReleaseOutcome::Retained | ReleaseOutcome::Freed => DirectBufErrorCode::Success,
        ReleaseOutcome::Unknown => DirectBufErrorCode::UnknownBuffer,
    }
}

/// Audit the global pool; writes the number of outstanding buffers
#[no_mangle]
pub extern "C" fn directbuf_check_leaks(count: *mut usize) -> DirectBufErrorCode {
    match global::check_leaks() {
        Ok(report) => {
            if !count.is_null() {
                unsafe {
                    *count = report.count();
                }
            }
            DirectBufErrorCode::Success
        }
        Err(e) => e.into(),
    }
}

/// Get global pool statistics
#[no_mangle]
pub extern "C" fn directbuf_pool_stats(stats: *mut DirectBufPoolStats) -> DirectBufErrorCode {
    if stats.is_null() {
        return DirectBufErrorCode::InvalidParameter;
    }

    let pool_stats = match global::pool() {
        Ok(pool) => pool.stats(),
        Err(e) => return e.into(),
    };

    unsafe {
        (*stats).hits = pool_stats.hits;
        (*stats).misses = pool_stats.misses;
        (*stats).allocation_failures = pool_stats.allocation_failures;
        (*stats).releases_retained = pool_stats.releases_retained;
        (*stats).releases_freed = pool_stats.releases_freed;
        (*stats).currently_outstanding = pool_stats.currently_outstanding;
        (*stats).currently_available = pool_stats.currently_available;
        (*stats).hit_rate = pool_stats.hit_rate();
    }

    DirectBufErrorCode::Success
}

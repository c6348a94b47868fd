//! FFI type definitions and handle types

use std::ffi::c_void;

use crate::error::DirectBufError;

/// Opaque buffer handle for the C API
pub type DirectBufBufferHandle = *mut c_void;

/// Error codes for C API
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectBufErrorCode {
    Success = 0,
    InvalidParameter = 1,
    OutOfMemory = 2,
    UnknownBuffer = 3,
}

impl From<DirectBufError> for DirectBufErrorCode {
    fn from(error: DirectBufError) -> Self {
        match error {
            DirectBufError::InvalidParameter { .. } => DirectBufErrorCode::InvalidParameter,
            DirectBufError::OutOfMemory { .. } => DirectBufErrorCode::OutOfMemory,
            DirectBufError::UnknownBuffer { .. } => DirectBufErrorCode::UnknownBuffer,
        }
    }
}

/// Buffer information (C-compatible)
#[repr(C)]
pub struct DirectBufBufferInfo {
    pub data: *mut u8,
    pub len: usize,
    pub capacity: usize,
    pub sequence: u64,
}

/// Pool statistics (C-compatible)
#[repr(C)]
pub struct DirectBufPoolStats {
    pub hits: u64,
    pub misses: u64,
    pub allocation_failures: u64,
    pub releases_retained: u64,
    pub releases_freed: u64,
    pub currently_outstanding: usize,
    pub currently_available: usize,
    pub hit_rate: f64,
}

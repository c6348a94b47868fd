//! C Foreign Function Interface (FFI)
//!
//! A C-compatible API over the process-wide pool in [`crate::global`], for
//! callers that manage buffers from C, C++ or a JNI shim.

pub mod buffers;
pub mod types;
pub mod utils;
pub mod version;

pub use types::{DirectBufBufferHandle, DirectBufBufferInfo, DirectBufErrorCode, DirectBufPoolStats};

pub use utils::{directbuf_free_string, HANDLE_REGISTRY};

// Buffer management API
pub use buffers::{
    directbuf_acquire, directbuf_buffer_capacity, directbuf_buffer_data, directbuf_buffer_info,
    directbuf_buffer_set_len, directbuf_check_leaks, directbuf_pool_stats, directbuf_release,
};

// Version API
pub use version::{
    directbuf_version_major, directbuf_version_minor, directbuf_version_patch,
    directbuf_version_string,
};

//! # directbuf - Pooled Native Buffer Allocator
//!
//! directbuf keeps a small pool of native (off-heap) memory regions so that
//! hot paths which repeatedly need a scratch buffer, such as codec or I/O
//! staging buffers, do not pay for a fresh allocation every time.
//!
//! ## Features
//!
//! - **Reuse before allocate**: a released buffer is handed out again to any
//!   request it is large enough for
//! - **Bounded retention**: at most `capacity_limit` released buffers are
//!   kept; further releases free their region
//! - **Leak audits**: an explicit audit lists every buffer acquired and never
//!   released
//! - **Pluggable allocator**: any [`NativeAllocator`] (libc by default)
//! - **C API**: optional `c-api` feature exposing the global pool
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐ acquire/release ┌──────────────────────────┐  allocate/free  ┌─────────────────┐
//! │  caller  │ ──────────────► │        BufferPool        │ ──────────────► │ NativeAllocator │
//! └──────────┘                 │  available │ outstanding │                 └─────────────────┘
//!                              └──────────────────────────┘
//!                                    │ audit_leaks
//!                                    ▼
//!                              ┌──────────────┐
//!                              │ LeakReporter │
//!                              └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use directbuf::{BufferPool, BufferPoolConfig, ReleaseOutcome};
//!
//! let pool = BufferPool::new(BufferPoolConfig::new("codec")).unwrap();
//! let mut buffer = pool.acquire(256).unwrap();
//! buffer.extend_from_slice(b"frame").unwrap();
//! assert_eq!(pool.release(buffer), ReleaseOutcome::Retained);
//!
//! // Served from the pool, no new native allocation.
//! let again = pool.acquire(128).unwrap();
//! assert_eq!(again.capacity(), 256);
//! pool.release(again);
//! assert!(pool.audit_leaks().is_clean());
//! ```

pub mod allocators;
pub mod buffers;
pub mod error;
pub mod global;
pub mod leaks;

#[cfg(feature = "c-api")]
pub mod ffi;

// Main API re-exports
pub use allocators::{BufferHandle, NativeAllocator, SystemAllocator, TrackingAllocator, TrackingStats};
pub use buffers::{
    BufferPool, BufferPoolConfig, BufferPoolConfigBuilder, BufferPoolStats, PooledBuffer,
    ReleaseOutcome, SelectionPolicy,
};
pub use error::{DirectBufError, Result};
pub use leaks::{CollectingLeakReporter, LeakReport, LeakReporter, LeakedBuffer, LogLeakReporter};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Default configuration constants
pub mod config {
    /// Default number of released buffers a pool retains
    pub const DEFAULT_CAPACITY_LIMIT: usize = crate::buffers::DEFAULT_CAPACITY_LIMIT;
}

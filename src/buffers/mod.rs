//! Buffer management and pooling
//!
//! This module provides the pooled buffer manager and the caller-facing
//! buffer view it hands out.

pub mod buffer;
pub mod config;
pub mod pool;
pub mod stats;

// Re-export main types
pub use buffer::PooledBuffer;
pub use config::{BufferPoolConfig, BufferPoolConfigBuilder, SelectionPolicy, DEFAULT_CAPACITY_LIMIT};
pub use pool::{BufferPool, ReleaseOutcome};
pub use stats::{next_buffer_sequence, BufferPoolStats};

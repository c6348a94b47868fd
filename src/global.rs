//! Process-wide default pool
//!
//! Convenience entry points for code that does not want to thread a
//! [`BufferPool`] through its call graph. The pool is created on first use
//! with the default configuration under the name `"global"`.

use crate::{
    buffers::{BufferPool, BufferPoolConfig, PooledBuffer, ReleaseOutcome},
    error::Result,
    leaks::LeakReport,
};

lazy_static::lazy_static! {
    static ref GLOBAL_POOL: Option<BufferPool> = match BufferPool::new(BufferPoolConfig::new("global")) {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::error!("failed to create global buffer pool: {}", e);
            None
        }
    };
}

/// The global pool.
///
/// The default configuration always validates, so this only fails if that
/// invariant is broken.
pub fn pool() -> Result<&'static BufferPool> {
    GLOBAL_POOL.as_ref().ok_or_else(|| {
        crate::error::DirectBufError::invalid_parameter("global", "global pool is unavailable")
    })
}

/// Acquire a buffer from the global pool
pub fn acquire(size: usize) -> Result<PooledBuffer> {
    pool()?.acquire(size)
}

/// Release a buffer to the global pool
pub fn release(buffer: PooledBuffer) -> ReleaseOutcome {
    match pool() {
        Ok(pool) => pool.release(buffer),
        Err(_) => ReleaseOutcome::Unknown,
    }
}

/// Audit the global pool for buffers never released
pub fn check_leaks() -> Result<LeakReport> {
    Ok(pool()?.audit_leaks())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_round_trip() {
        let buffer = acquire(48).unwrap();
        assert!(buffer.capacity() >= 48);
        assert_eq!(buffer.pool_id(), pool().unwrap().id());
        assert_ne!(release(buffer), ReleaseOutcome::Unknown);
        assert_eq!(pool().unwrap().config().name, "global");
    }
}

//! Caller-facing view over a pooled native region

use std::{fmt, slice, sync::Arc};

use crate::{
    allocators::{BufferHandle, NativeAllocator},
    error::{DirectBufError, Result},
};

/// Exclusive view over a native memory region of fixed capacity.
///
/// A `PooledBuffer` is handed out by [`BufferPool::acquire`] and must be given
/// back through [`BufferPool::release`]. It is deliberately not `Clone`, so at
/// most one view exists per region, and dropping it does not free anything:
/// an unreleased buffer stays outstanding and shows up in a leak audit.
///
/// Each view holds a reference to the allocator that produced its region, so
/// the region stays valid even if the issuing pool is dropped first.
///
/// The buffer tracks a logical length (`len`) inside its capacity. Reads see
/// `0..len`; writes may extend `len` up to `capacity`.
///
/// [`BufferPool::acquire`]: super::BufferPool::acquire
/// [`BufferPool::release`]: super::BufferPool::release
pub struct PooledBuffer {
    handle: BufferHandle,
    capacity: usize,
    len: usize,
    pool_id: u64,
    sequence: u64,
    /// Keeps the backing store alive while the view exists
    allocator: Arc<dyn NativeAllocator>,
}

impl PooledBuffer {
    /// Build a fresh, empty view. Only the pool constructs these.
    pub(crate) fn new(
        handle: BufferHandle,
        capacity: usize,
        pool_id: u64,
        sequence: u64,
        allocator: Arc<dyn NativeAllocator>,
    ) -> Self {
        Self {
            handle,
            capacity,
            len: 0,
            pool_id,
            sequence,
            allocator,
        }
    }

    /// Opaque handle of the underlying region
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Identifier of the pool that issued this buffer
    pub fn pool_id(&self) -> u64 {
        self.pool_id
    }

    /// Sequence number assigned when this buffer was last acquired
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Get a raw pointer to the buffer data
    pub fn as_ptr(&self) -> *const u8 {
        self.handle.as_non_null().as_ptr()
    }

    /// Get a mutable raw pointer to the buffer data
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.handle.as_non_null().as_ptr()
    }

    /// The written portion of the buffer
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the region is `capacity` bytes, initialized when first
        // allocated, exclusively viewed by `self`, and `len <= capacity`.
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// The written portion of the buffer, mutably
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len;
        // SAFETY: as for `as_slice`; `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// The unwritten tail between `len` and `capacity`.
    ///
    /// Contents are whatever a previous holder left there; call [`set_len`] after
    /// filling it.
    ///
    /// [`set_len`]: Self::set_len
    pub fn spare_capacity_mut(&mut self) -> &mut [u8] {
        let (len, cap) = (self.len, self.capacity);
        // SAFETY: `len..cap` lies inside the region, which the pool zero-fills
        // on first allocation, so every byte is initialized (possibly stale).
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr().add(len), cap - len) }
    }

    /// Capacity of the underlying region in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Logical length of the buffer
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that can still be appended
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    /// Set the logical length
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > self.capacity {
            return Err(DirectBufError::invalid_parameter(
                "len",
                format!("{} exceeds capacity {}", len, self.capacity),
            ));
        }
        self.len = len;
        Ok(())
    }

    /// Reset the logical length to zero. Region contents are left as-is.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Zero the whole region
    pub fn zero(&mut self) {
        // SAFETY: the region is valid for writes of `capacity` bytes while
        // `self.allocator` is alive, and no other view aliases it.
        unsafe {
            std::ptr::write_bytes(self.as_mut_ptr(), 0, self.capacity);
        }
    }

    /// Write data at `offset`, extending the length if needed
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= self.capacity)
            .ok_or_else(|| {
                DirectBufError::invalid_parameter(
                    "data",
                    format!(
                        "write of {} bytes at offset {} exceeds capacity {}",
                        data.len(),
                        offset,
                        self.capacity
                    ),
                )
            })?;

        // SAFETY: `offset..end` is within the region; `data` is a separate Rust
        // allocation so the ranges cannot overlap.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.as_mut_ptr().add(offset), data.len());
        }

        if end > self.len {
            self.len = end;
        }
        Ok(())
    }

    /// Append data after the current length
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        self.write(self.len, data)
    }

    /// Borrow `len` written bytes starting at `offset`
    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8]> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(&self.as_slice()[offset..end]),
            _ => Err(DirectBufError::invalid_parameter(
                "offset",
                format!("read of {} bytes at offset {} exceeds length {}", len, offset, self.len),
            )),
        }
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("handle", &self.handle)
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .field("pool_id", &self.pool_id)
            .field("sequence", &self.sequence)
            .field("allocator", &self.allocator.type_name())
            .finish()
    }
}

// A view is exclusively owned by whoever holds it; shared access is read-only.
// The allocator reference is itself `Send + Sync`.
unsafe impl Send for PooledBuffer {}
unsafe impl Sync for PooledBuffer {}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for PooledBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::SystemAllocator;

    fn with_buffer(capacity: usize, f: impl FnOnce(&mut PooledBuffer)) {
        let allocator = Arc::new(SystemAllocator::new());
        let ptr = allocator.allocate(capacity).unwrap();
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, capacity) };
        let mut buffer = PooledBuffer::new(BufferHandle::new(ptr), capacity, 1, 1, allocator.clone());
        f(&mut buffer);
        drop(buffer);
        unsafe { allocator.free(ptr, capacity) };
    }

    #[test]
    fn test_write_and_read() {
        with_buffer(16, |buffer| {
            assert!(buffer.is_empty());
            buffer.write(0, b"hello").unwrap();
            assert_eq!(buffer.len(), 5);
            assert_eq!(buffer.read(1, 3).unwrap(), b"ell");
            assert_eq!(buffer.as_slice(), b"hello");
            assert_eq!(buffer.remaining(), 11);
        });
    }

    #[test]
    fn test_write_past_capacity_fails() {
        with_buffer(4, |buffer| {
            assert!(buffer.write(2, b"abc").is_err());
            assert!(buffer.write(usize::MAX, b"a").is_err());
            assert!(buffer.is_empty());
        });
    }

    #[test]
    fn test_read_past_len_fails() {
        with_buffer(8, |buffer| {
            buffer.extend_from_slice(b"ab").unwrap();
            assert!(buffer.read(1, 2).is_err());
        });
    }

    #[test]
    fn test_extend_and_clear() {
        with_buffer(8, |buffer| {
            buffer.extend_from_slice(b"ab").unwrap();
            buffer.extend_from_slice(b"cd").unwrap();
            assert_eq!(buffer.as_slice(), b"abcd");
            buffer.clear();
            assert_eq!(buffer.len(), 0);
            assert_eq!(buffer.capacity(), 8);
        });
    }

    #[test]
    fn test_spare_capacity_and_set_len() {
        with_buffer(8, |buffer| {
            buffer.spare_capacity_mut()[..3].copy_from_slice(b"xyz");
            buffer.set_len(3).unwrap();
            assert_eq!(buffer.as_slice(), b"xyz");
            assert!(buffer.set_len(9).is_err());
        });
    }

    #[test]
    fn test_zero() {
        with_buffer(4, |buffer| {
            buffer.write(0, &[7, 7, 7, 7]).unwrap();
            buffer.zero();
            assert_eq!(buffer.as_slice(), &[0, 0, 0, 0]);
        });
    }
}

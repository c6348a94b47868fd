//! FFI utilities and handle management

use std::{
    collections::HashMap,
    ffi::{c_char, CString},
};

use parking_lot::Mutex;

use crate::buffers::PooledBuffer;

// Buffers held by C callers between acquire and release
lazy_static::lazy_static! {
    pub static ref HANDLE_REGISTRY: Mutex<HandleRegistry> = Mutex::new(HandleRegistry::new());
}

pub struct HandleRegistry {
    pub(crate) buffers: HashMap<usize, PooledBuffer>,
    pub(crate) next_id: usize,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn store_buffer(&mut self, buffer: PooledBuffer) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.buffers.insert(id, buffer);
        id
    }

    pub fn take_buffer(&mut self, id: usize) -> Option<PooledBuffer> {
        self.buffers.remove(&id)
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert Rust String to C string (caller must free with directbuf_free_string)
pub fn string_to_c_str(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a C string allocated by this library
#[no_mangle]
pub extern "C" fn directbuf_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global;

    #[test]
    fn test_registry_ids_are_unique_and_single_use() {
        let mut registry = HandleRegistry::new();
        let first = registry.store_buffer(global::acquire(8).unwrap());
        let second = registry.store_buffer(global::acquire(8).unwrap());
        assert_ne!(first, second);

        let buffer = registry.take_buffer(first).unwrap();
        assert!(registry.take_buffer(first).is_none());
        global::release(buffer);
        global::release(registry.take_buffer(second).unwrap());
    }
}

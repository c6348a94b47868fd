//! Error types and handling for directbuf

/// Result type alias for directbuf operations
pub type Result<T> = std::result::Result<T, DirectBufError>;

/// Error types surfaced by the pooled buffer manager
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectBufError {
    /// The native allocator could not satisfy an allocation request
    #[error("Out of memory: native allocation of {requested} bytes failed")]
    OutOfMemory { requested: usize },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// A buffer was handed back that this pool never issued, or already freed
    #[error("Unknown buffer: handle {handle:#x} is not outstanding in this pool")]
    UnknownBuffer { handle: usize },
}

impl DirectBufError {
    /// Create an out-of-memory error
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an unknown buffer error
    pub fn unknown_buffer(handle: usize) -> Self {
        Self::UnknownBuffer { handle }
    }

    /// Whether the error is fatal to the call (not worth retrying).
    ///
    /// Nothing in this crate retries internally; an exhausted native allocator
    /// is treated as fatal for the call that hit it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DirectBufError::out_of_memory(1024);
        assert!(matches!(err, DirectBufError::OutOfMemory { requested: 1024 }));
        assert!(err.is_fatal());

        let err = DirectBufError::invalid_parameter("size", "must be positive");
        assert!(matches!(err, DirectBufError::InvalidParameter { .. }));
        assert!(!err.is_fatal());

        let err = DirectBufError::unknown_buffer(0xdead);
        assert!(matches!(err, DirectBufError::UnknownBuffer { handle: 0xdead }));
    }

    #[test]
    fn test_error_display() {
        let err = DirectBufError::out_of_memory(64);
        let display = format!("{}", err);
        assert!(display.contains("Out of memory"));
        assert!(display.contains("64 bytes"));

        let err = DirectBufError::unknown_buffer(0x10);
        assert!(format!("{}", err).contains("0x10"));
    }
}

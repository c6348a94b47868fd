//! Buffer pool configuration

use serde::{Deserialize, Serialize};

use crate::error::{DirectBufError, Result};

/// Default number of released buffers a pool keeps for reuse
pub const DEFAULT_CAPACITY_LIMIT: usize = 10;

/// How `acquire` picks among several available buffers that are large enough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Smallest sufficient capacity; ties go to the least recently acquired
    #[default]
    SmallestFit,
    /// Whichever sufficient buffer the scan meets first (unordered)
    FirstFit,
}

/// Configuration for buffer pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferPoolConfig {
    /// Name of the buffer pool, used in logs and leak reports
    pub name: String,
    /// Soft bound on how many released buffers are retained for reuse.
    ///
    /// Checked only when a buffer is released: a release that finds this many
    /// buffers already available frees its region instead of keeping it.
    pub capacity_limit: usize,
    /// Tie-break among sufficient available buffers
    pub selection: SelectionPolicy,
    /// Zero-fill a reused region before handing it out again
    pub zero_on_reuse: bool,
    /// Reject requests larger than this many bytes
    pub max_buffer_size: Option<usize>,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            capacity_limit: DEFAULT_CAPACITY_LIMIT,
            selection: SelectionPolicy::default(),
            zero_on_reuse: false,
            max_buffer_size: None,
        }
    }
}

impl BufferPoolConfig {
    /// Create a new configuration with custom name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the retained-buffer limit
    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity_limit = limit;
        self
    }

    /// Set the selection policy
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Zero reused regions before hand-off
    pub fn with_zero_on_reuse(mut self, zero: bool) -> Self {
        self.zero_on_reuse = zero;
        self
    }

    /// Cap the size of a single request
    pub fn with_max_buffer_size(mut self, max: Option<usize>) -> Self {
        self.max_buffer_size = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DirectBufError::invalid_parameter(
                "name",
                "Pool name cannot be empty",
            ));
        }

        if self.max_buffer_size == Some(0) {
            return Err(DirectBufError::invalid_parameter(
                "max_buffer_size",
                "Max buffer size cannot be zero",
            ));
        }

        Ok(())
    }

    /// Check a request size against this configuration
    pub fn check_request(&self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(DirectBufError::invalid_parameter(
                "size",
                "Requested size must be positive",
            ));
        }

        if let Some(max) = self.max_buffer_size {
            if size > max {
                return Err(DirectBufError::invalid_parameter(
                    "size",
                    format!("Requested size {} exceeds max buffer size {}", size, max),
                ));
            }
        }

        Ok(())
    }
}

/// Builder pattern for buffer pool configuration
pub struct BufferPoolConfigBuilder {
    config: BufferPoolConfig,
}

impl BufferPoolConfigBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: BufferPoolConfig::new(name),
        }
    }

    /// Set the retained-buffer limit
    pub fn capacity_limit(mut self, limit: usize) -> Self {
        self.config.capacity_limit = limit;
        self
    }

    /// Pick the smallest sufficient buffer
    pub fn smallest_fit(mut self) -> Self {
        self.config.selection = SelectionPolicy::SmallestFit;
        self
    }

    /// Pick the first sufficient buffer found
    pub fn first_fit(mut self) -> Self {
        self.config.selection = SelectionPolicy::FirstFit;
        self
    }

    /// Enable or disable zeroing on reuse
    pub fn zero_on_reuse(mut self, enable: bool) -> Self {
        self.config.zero_on_reuse = enable;
        self
    }

    /// Set the largest accepted request
    pub fn max_buffer_size(mut self, max: usize) -> Self {
        self.config.max_buffer_size = Some(max);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<BufferPoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BufferPoolConfig::default();
        assert_eq!(config.capacity_limit, DEFAULT_CAPACITY_LIMIT);
        assert_eq!(config.selection, SelectionPolicy::SmallestFit);
        assert!(!config.zero_on_reuse);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = BufferPoolConfigBuilder::new("codec")
            .capacity_limit(2)
            .first_fit()
            .zero_on_reuse(true)
            .max_buffer_size(4096)
            .build()
            .unwrap();

        assert_eq!(config.name, "codec");
        assert_eq!(config.capacity_limit, 2);
        assert_eq!(config.selection, SelectionPolicy::FirstFit);
        assert!(config.zero_on_reuse);
        assert_eq!(config.max_buffer_size, Some(4096));
    }

    #[test]
    fn test_validation() {
        assert!(BufferPoolConfig::new("").validate().is_err());
        assert!(BufferPoolConfig::new("p")
            .with_max_buffer_size(Some(0))
            .validate()
            .is_err());
        assert!(BufferPoolConfig::new("p").with_capacity_limit(0).validate().is_ok());
    }

    #[test]
    fn test_check_request() {
        let config = BufferPoolConfig::new("p").with_max_buffer_size(Some(100));
        assert!(config.check_request(0).is_err());
        assert!(config.check_request(100).is_ok());
        assert!(config.check_request(101).is_err());
    }

    #[test]
    fn test_serde_round_trip_with_defaults() {
        let config: BufferPoolConfig =
            serde_json::from_str(r#"{"name":"io","capacity_limit":4,"selection":"first_fit"}"#)
                .unwrap();
        assert_eq!(config.name, "io");
        assert_eq!(config.capacity_limit, 4);
        assert_eq!(config.selection, SelectionPolicy::FirstFit);
        assert_eq!(config.max_buffer_size, None);
    }
}

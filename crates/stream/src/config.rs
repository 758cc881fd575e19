//! Session configuration
//!
//! Limits protect readers from hostile or corrupt length prefixes and from
//! unbounded recursion; the writer enforces the same depth limit so that
//! anything it produces can be read back with the same configuration.
//!
//! ```toml
//! max_depth = 512
//! max_string_len = 16777216
//! max_sequence_len = 16777216
//! buffer_capacity = 8192
//! ```

use keepsake_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum object nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Default maximum string length in bytes (16 MiB)
pub const DEFAULT_MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Default maximum sequence length
pub const DEFAULT_MAX_SEQUENCE_LEN: usize = 1 << 24;

/// Default buffer capacity for file-backed sessions
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Limits and buffering for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    /// Maximum object nesting depth
    pub max_depth: usize,
    /// Maximum string length in bytes
    pub max_string_len: usize,
    /// Maximum number of sequence elements
    pub max_sequence_len: usize,
    /// Buffer size for file-backed sessions
    pub buffer_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl StreamConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum string length
    pub fn max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Set the maximum sequence length
    pub fn max_sequence_len(mut self, len: usize) -> Self {
        self.max_sequence_len = len;
        self
    }

    /// Set the file buffer capacity
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Check that every limit is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        if self.buffer_capacity == 0 {
            return Err(Error::Config("buffer_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: StreamConfig =
            toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

//! Stream configuration shared by the writer and the reader.

use crate::error::{Error, Result};
use crate::model::SENTINEL;

/// Default number of whole bytes buffered before the writer flushes.
pub const DEFAULT_PREFERRED_BUFFER_SIZE: usize = 32;

/// Default number of bytes the reader pulls from its source per chunk.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 32;

/// The platform line ending.
#[cfg(windows)]
pub const DEFAULT_LINE_ENDING: &str = "\r\n";

/// The platform line ending.
#[cfg(not(windows))]
pub const DEFAULT_LINE_ENDING: &str = "\n";

/// Tunables for `HuffmanWriter` and `HuffmanReader`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Writer flush threshold in whole bytes (>= 1)
    pub preferred_buffer_size: usize,

    /// Appended by `write_line`, stripped by `read_line`
    pub line_ending: String,

    /// Bytes requested from the source per read (>= 1)
    pub read_chunk_size: usize,
}

impl StreamConfig {
    /// Configuration with a custom line ending and default sizes.
    pub fn with_line_ending(line_ending: impl Into<String>) -> Self {
        Self {
            line_ending: line_ending.into(),
            ..Self::default()
        }
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.preferred_buffer_size == 0 {
            return Err(Error::Config(
                "preferred buffer size must be at least 1 byte".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(Error::Config(
                "read chunk size must be at least 1 byte".to_string(),
            ));
        }
        validate_line_ending(&self.line_ending)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            preferred_buffer_size: DEFAULT_PREFERRED_BUFFER_SIZE,
            line_ending: DEFAULT_LINE_ENDING.to_string(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// A line ending must be non-empty and must not contain the sentinel.
pub(crate) fn validate_line_ending(line_ending: &str) -> Result<()> {
    if line_ending.is_empty() {
        return Err(Error::Config("line ending must not be empty".to_string()));
    }
    if line_ending.contains(SENTINEL) {
        return Err(Error::Config(
            "line ending must not contain the end-of-stream character".to_string(),
        ));
    }
    Ok(())
}

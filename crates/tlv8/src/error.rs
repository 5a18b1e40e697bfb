//! Error types for TLV8 operations.

use thiserror::Error;

/// Errors that can occur while decoding or reading a TLV8 container.
#[derive(Debug, Error)]
pub enum Tlv8Error {
    /// The stream ended inside a wire entry.
    #[error("truncated entry at offset {offset}: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Stream offset where the missing bytes should have started.
        offset: usize,
        /// Number of bytes the entry required.
        expected: usize,
        /// Number of bytes actually available.
        actual: usize,
    },

    /// A reassembled value grew past the configured limit.
    #[error("value for type 0x{tlv_type:02X} too large: {size} bytes (max {max})")]
    ValueTooLarge {
        /// Type code of the offending value.
        tlv_type: u8,
        /// Size the value would have reached.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Stored bytes are not valid UTF-8.
    #[error("invalid UTF-8 in value for type 0x{tlv_type:02X}")]
    InvalidUtf8 {
        /// Type code whose value failed to decode.
        tlv_type: u8,
    },

    /// The underlying byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Tlv8Error {
    /// Create a truncation error at a specific stream offset.
    pub fn truncated(offset: usize, expected: usize, actual: usize) -> Self {
        Tlv8Error::Truncated {
            offset,
            expected,
            actual,
        }
    }

    /// Whether this error was caused by the input ending early.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Tlv8Error::Truncated { .. })
    }
}

/// Result type alias for TLV8 operations.
pub type Tlv8Result<T> = Result<T, Tlv8Error>;

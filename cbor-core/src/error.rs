//! Error types for the decoder

use thiserror::Error;

/// Result type for decode operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Decoder errors
///
/// Every variant aborts the entire decode operation; callers never observe a
/// partially decoded value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended before the current item was complete
    #[error("input truncated at byte {offset}")]
    Truncated {
        /// Byte offset at which the read started
        offset: usize,
    },

    /// Length or argument encoding outside the canonical subset
    #[error("malformed length at byte {offset}: {reason}")]
    MalformedLength {
        /// Byte offset of the offending item
        offset: usize,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Item has a major type the caller cannot accept at this position
    #[error("unsupported major type {found} at byte {offset}, expected {expected}")]
    UnsupportedMajorType {
        /// Byte offset of the offending item
        offset: usize,
        /// What the caller was reading
        expected: &'static str,
        /// Major type actually present
        found: u8,
    },

    /// Reserved additional-info values, indefinite lengths, or unknown
    /// simple values
    #[error("reserved or indefinite-length encoding at byte {offset}")]
    ReservedEncoding {
        /// Byte offset of the offending item
        offset: usize,
    },

    /// Text item holds invalid UTF-8
    #[error("text item at byte {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Byte offset of the offending item
        offset: usize,
    },

    /// Value tree nests deeper than the decoder allows
    #[error("nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// Configured depth limit
        limit: usize,
    },

    /// Bytes remain after the top-level value
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes {
        /// Number of unconsumed bytes
        remaining: usize,
    },

    /// Content identifier failed the fixed-prefix check
    #[error("invalid content identifier: {0}")]
    InvalidCid(&'static str),

    /// Actor identity is empty or structurally invalid
    #[error("invalid actor address: {0}")]
    InvalidAddress(&'static str),
}

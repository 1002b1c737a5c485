//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while reading or writing wire bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Indefinite-length items are not part of the wire format.
    #[error("indefinite-length items are not supported")]
    IndefiniteLength,

    /// Invalid UTF-8 in a text string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// The next item is not of the requested type.
    #[error("expected {expected}, found major type {found}")]
    UnexpectedType {
        /// What the caller asked for.
        expected: &'static str,
        /// The major type actually present.
        found: u8,
    },

    /// A declared length exceeds the wire ceilings.
    #[error("declared length {declared} exceeds limit {limit}")]
    LengthLimitExceeded {
        /// The length declared in the payload.
        declared: u64,
        /// The enforced ceiling.
        limit: u64,
    },

    /// Structurally invalid CBOR.
    #[error("invalid CBOR structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unexpected type error.
    pub fn unexpected_type(expected: &'static str, found: u8) -> Self {
        Self::UnexpectedType { expected, found }
    }
}

//! Error types for the sync core.

use shadowsync_codec::{CodecError, Kind};
use thiserror::Error;

/// Result type for sync-core operations.
pub type ShadowResult<T> = Result<T, ShadowError>;

/// Errors that can occur in the property-sync layer.
///
/// Only hard failures surface here. Per-entry conditions during
/// decode (unknown identifiers, writes to read-only properties, kind
/// mismatches from the peer) are skipped and logged, not raised:
/// the device's control loop must keep running through routine sync
/// noise.
#[derive(Debug, Error)]
pub enum ShadowError {
    /// The caller's buffer cannot hold the encoded sequence.
    ///
    /// Nothing was written and no property was marked reported; a
    /// retry with a larger buffer re-encodes the same set.
    #[error("output buffer too small: need {needed} bytes, have {capacity}")]
    BufferTooSmall {
        /// Bytes the encoded sequence requires.
        needed: usize,
        /// Bytes the caller provided.
        capacity: usize,
    },

    /// `read()` on a property whose permission excludes READ.
    #[error("property '{name}' is not readable")]
    ReadDenied {
        /// The property's name.
        name: String,
    },

    /// `write()` on a property whose permission excludes WRITE.
    #[error("property '{name}' is not writable")]
    WriteDenied {
        /// The property's name.
        name: String,
    },

    /// A value's kind does not match the bound variable.
    #[error("property '{name}' expects {expected}, got {got}")]
    KindMismatch {
        /// The property's name.
        name: String,
        /// Kind of the bound variable.
        expected: Kind,
        /// Kind of the rejected value.
        got: Kind,
    },

    /// A property with this name is already registered.
    #[error("duplicate property name '{name}'")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// Property names must be non-empty.
    #[error("property name must not be empty")]
    EmptyName,

    /// Malformed wire payload.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

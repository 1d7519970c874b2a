//! Error types for the mask payload.

use thiserror::Error;

/// A stored mask payload that cannot be assigned to the mask buffers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Payload size does not match the mask shape
    #[error("Payload has {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// First byte is not the start marker
    #[error("Invalid start marker {found}")]
    BadStartMarker { found: u8 },

    /// Last byte is not the end marker
    #[error("Invalid end marker {found}")]
    BadEndMarker { found: u8 },

    /// Mask and user buffers differ in length
    #[error("Mask has {mask} bytes but user mask has {user}")]
    BufferMismatch { mask: usize, user: usize },
}

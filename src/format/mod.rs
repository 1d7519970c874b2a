//! Byte layout of stored masks.
//!
//! The backend stores a mask as one payload: a start marker, the label
//! buffer, the user buffer and an end marker. Markers and length are checked
//! before a payload is assigned to the mask so that a truncated or corrupt
//! download never reaches the editor.

mod error;
mod payload;

pub use error::PayloadError;
pub use payload::{decode_payload, encode_payload, payload_len};

//! Stored mask byte layout: `[254][mask bytes][user mask bytes][254]`.

use super::error::PayloadError;
use crate::constants::MAGIC_BYTE;

/// Encode the label and user buffers into one payload.
pub fn encode_payload(mask: &[u8], user_mask: &[u8]) -> Result<Vec<u8>, PayloadError> {
    if mask.len() != user_mask.len() {
        return Err(PayloadError::BufferMismatch {
            mask: mask.len(),
            user: user_mask.len(),
        });
    }

    let mut payload = Vec::with_capacity(payload_len(mask.len()));
    payload.push(MAGIC_BYTE);
    payload.extend_from_slice(mask);
    payload.extend_from_slice(user_mask);
    payload.push(MAGIC_BYTE);
    Ok(payload)
}

/// Split a payload into label and user buffers of `mask_len` bytes each.
///
/// Length and both markers are checked before anything is returned.
pub fn decode_payload(bytes: &[u8], mask_len: usize) -> Result<(Vec<u8>, Vec<u8>), PayloadError> {
    let expected = payload_len(mask_len);
    if bytes.len() != expected {
        return Err(PayloadError::LengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let (first, last) = (bytes[0], bytes[expected - 1]);
    if first != MAGIC_BYTE {
        return Err(PayloadError::BadStartMarker { found: first });
    }
    if last != MAGIC_BYTE {
        return Err(PayloadError::BadEndMarker { found: last });
    }

    let mask = bytes[1..=mask_len].to_vec();
    let user_mask = bytes[mask_len + 1..=2 * mask_len].to_vec();
    Ok((mask, user_mask))
}

/// Size of a payload holding a mask of `mask_len` pixels.
pub fn payload_len(mask_len: usize) -> usize {
    2 * mask_len + 2
}

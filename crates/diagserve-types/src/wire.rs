//! the fixed-record wire format for diagnosis keys.
//!
//! a diagnosis key takes 21 bytes on the wire: 16 bytes of temporary
//! exposure key, 4 bytes of rolling start number (big-endian) and 1 byte of
//! transmission risk level. records are concatenated back to back with no
//! delimiter, framing or trailer, so a valid payload is always a multiple
//! of 21 bytes.

use thiserror::Error;

use crate::{DiagnosisKey, TemporaryExposureKey};

/// size of one encoded diagnosis key.
pub const DIAGNOSIS_KEY_SIZE: usize = TemporaryExposureKey::LEN + 4 + 1;

/// errors produced when framing a byte stream into diagnosis keys.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// the payload is empty or not a whole number of records.
    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// append the wire representation of one key to a buffer.
pub fn encode_into(buf: &mut Vec<u8>, key: &DiagnosisKey) {
    buf.extend_from_slice(key.temporary_exposure_key.as_bytes());
    buf.extend_from_slice(&key.rolling_start_number.to_be_bytes());
    buf.push(key.transmission_risk_level);
}

/// encode a sequence of keys into a single contiguous buffer, preserving
/// order. the result is `keys.len() * 21` bytes.
pub fn encode(keys: &[DiagnosisKey]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(keys.len() * DIAGNOSIS_KEY_SIZE);
    for key in keys {
        encode_into(&mut buf, key);
    }
    buf
}

/// decode an exhaustive sequence of keys from a payload.
///
/// field values are not validated; a key with `rolling_start_number = 0`
/// decodes fine. an empty payload is an error, matching the upload
/// protocol where an empty POST body is rejected.
pub fn decode(buf: &[u8]) -> Result<Vec<DiagnosisKey>, WireError> {
    if buf.is_empty() || buf.len() % DIAGNOSIS_KEY_SIZE != 0 {
        return Err(WireError::UnexpectedEof);
    }

    let keys = buf
        .chunks_exact(DIAGNOSIS_KEY_SIZE)
        .map(decode_record)
        .collect();
    Ok(keys)
}

/// decode one 21-byte record. callers guarantee the slice length.
fn decode_record(record: &[u8]) -> DiagnosisKey {
    let mut key = [0u8; TemporaryExposureKey::LEN];
    key.copy_from_slice(&record[..TemporaryExposureKey::LEN]);
    let rolling_start_number =
        u32::from_be_bytes([record[16], record[17], record[18], record[19]]);

    DiagnosisKey::new(
        TemporaryExposureKey::from_bytes(key),
        rolling_start_number,
        record[20],
    )
}

//! the diagnosis key domain entity.
//!
//! a diagnosis key combines a device-generated temporary exposure key with
//! the 10-minute interval at which it became valid and the risk band the
//! reporting authority assigned to it. keys are created once, never mutated
//! and never deleted by this service.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// error returned when a string is not the hex encoding of a 16-byte key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("must be the hexadecimal encoding of a 16 byte key")]
pub struct InvalidCursor;

/// temporary exposure key - the opaque 16-byte identifier a device derives
/// on-device. doubles as the primary identifier of a [`DiagnosisKey`] and
/// as the cursor in the listing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TemporaryExposureKey([u8; Self::LEN]);

impl TemporaryExposureKey {
    /// byte length of a temporary exposure key.
    pub const LEN: usize = 16;

    /// the all-zeroes key. as a cursor it means "from the beginning".
    pub const ZERO: Self = Self([0; Self::LEN]);

    /// create a key from raw bytes.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// get the raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// check if this is the zero key.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// returns a short string representation for logging.
    pub fn short_string(&self) -> String {
        format!("tek:{:02x}{:02x}...", self.0[0], self.0[1])
    }
}

impl fmt::Display for TemporaryExposureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for TemporaryExposureKey {
    type Err = InvalidCursor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::LEN * 2 {
            return Err(InvalidCursor);
        }
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidCursor)?;
        Ok(Self(bytes))
    }
}

/// one reported diagnosis key.
///
/// the first three fields travel over the wire (see [`crate::wire`]);
/// `uploaded_at` is stamped by the server when a batch is persisted and is
/// only populated on keys read back from the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosisKey {
    /// the opaque device key, unique across the store.
    pub temporary_exposure_key: TemporaryExposureKey,
    /// 10-minute interval since unix epoch at which the key became valid.
    pub rolling_start_number: u32,
    /// risk band assigned by the reporting authority.
    pub transmission_risk_level: u8,
    /// server ingest time. `None` until the key has been persisted.
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl DiagnosisKey {
    /// create a not-yet-persisted diagnosis key.
    pub fn new(
        temporary_exposure_key: TemporaryExposureKey,
        rolling_start_number: u32,
        transmission_risk_level: u8,
    ) -> Self {
        Self {
            temporary_exposure_key,
            rolling_start_number,
            transmission_risk_level,
            uploaded_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cursor_roundtrip() {
        let key: TemporaryExposureKey = "0102030405060708090a0b0c0d0e0f10".parse().unwrap();
        assert_eq!(
            key.as_bytes(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]
        );
        assert_eq!(key.to_string(), "0102030405060708090a0b0c0d0e0f10");
    }

    #[test]
    fn test_parse_cursor_uppercase() {
        let key: TemporaryExposureKey = "A7752B99BE501C9C9E893B213AD82842".parse().unwrap();
        assert_eq!(key.as_bytes()[0], 0xa7);
    }

    #[test]
    fn test_parse_cursor_rejects_garbage() {
        assert_eq!(
            "foobar".parse::<TemporaryExposureKey>(),
            Err(InvalidCursor)
        );
        // right length, not hex
        assert_eq!(
            "zz752b99be501c9c9e893b213ad82842".parse::<TemporaryExposureKey>(),
            Err(InvalidCursor)
        );
        // 15 bytes
        assert_eq!(
            "0102030405060708090a0b0c0d0e0f".parse::<TemporaryExposureKey>(),
            Err(InvalidCursor)
        );
    }

    #[test]
    fn test_zero_key() {
        assert!(TemporaryExposureKey::ZERO.is_zero());
        assert!(
            "00000000000000000000000000000000"
                .parse::<TemporaryExposureKey>()
                .unwrap()
                .is_zero()
        );
        assert!(!TemporaryExposureKey::from_bytes([1; 16]).is_zero());
    }

    #[test]
    fn test_short_string() {
        let key = TemporaryExposureKey::from_bytes([
            0xab, 0xcd, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]);
        assert_eq!(key.short_string(), "tek:abcd...");
    }
}

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Length of a relay identity fingerprint in bytes
pub const FINGERPRINT_LEN: usize = 20;

/// Length of a hidden-service descriptor identifier in bytes
pub const DESC_ID_LEN: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("invalid fingerprint length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid fingerprint hex: {0}")]
    InvalidHex(String),
}

/// A relay identity fingerprint: the 20-byte hash naming a relay in the
/// consensus. The canonical text form is lowercase hex, which is also the
/// ordering used by the hidden-service directory ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, FingerprintError> {
        if bytes.len() != FINGERPRINT_LEN {
            return Err(FingerprintError::InvalidLength {
                expected: FINGERPRINT_LEN,
                actual: bytes.len(),
            });
        }

        let mut array = [0u8; FINGERPRINT_LEN];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, FingerprintError> {
        let decoded =
            hex::decode(hex_str).map_err(|err| FingerprintError::InvalidHex(err.to_string()))?;
        Self::from_slice(&decoded)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(self.0))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; FINGERPRINT_LEN]> for Fingerprint {
    fn from(value: [u8; FINGERPRINT_LEN]) -> Self {
        Self::from_bytes(value)
    }
}

impl TryFrom<&[u8]> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(value)
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// A time-rotating hidden-service descriptor identifier.
///
/// Hex form is used for positioning on the directory ring (same keyspace as
/// fingerprint hex); base32 form is used in directory request paths.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorId([u8; DESC_ID_LEN]);

impl DescriptorId {
    pub fn from_bytes(bytes: [u8; DESC_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DESC_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_base32(&self) -> String {
        data_encoding::BASE32_NOPAD.encode(&self.0)
    }
}

impl fmt::Debug for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DescriptorId({})", hex::encode(self.0))
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

//! Onion addresses and rotating descriptor identifiers.
//!
//! A v2 onion address is 16 base32 characters naming a 10-byte service
//! identifier. Descriptor identifiers derive from the service identifier,
//! the replica index, and the current rotation period; the period boundary
//! is staggered per service by a function of the first identifier byte so
//! the whole network does not hit the directories at once.

use rendnet_common::protocol::descriptor::{ROTATION_PERIOD_SECS, SERVICE_ID_LEN};
use rendnet_common::{DescriptorId, HsError};
use sha1::{Digest, Sha1};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// A v2 onion address (e.g. `duskgytldkxiuqc6.onion`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OnionAddress {
    service_id: [u8; SERVICE_ID_LEN],
    base32: String,
}

impl OnionAddress {
    /// Parse an onion address, with or without the `.onion` suffix.
    /// Input is case-insensitive and canonicalized to uppercase base32.
    pub fn parse(address: &str) -> Result<Self, HsError> {
        let trimmed = address.trim();
        let stripped = trimmed
            .strip_suffix(".onion")
            .or_else(|| trimmed.strip_suffix(".ONION"))
            .unwrap_or(trimmed);
        let base32 = stripped.to_uppercase();

        let decoded = data_encoding::BASE32_NOPAD
            .decode(base32.as_bytes())
            .map_err(|_| HsError::MalformedAddress(format!("invalid base32: {trimmed}")))?;

        if decoded.len() != SERVICE_ID_LEN {
            return Err(HsError::MalformedAddress(format!(
                "decoded to {} bytes, expected {}",
                decoded.len(),
                SERVICE_ID_LEN
            )));
        }

        let mut service_id = [0u8; SERVICE_ID_LEN];
        service_id.copy_from_slice(&decoded);
        Ok(Self { service_id, base32 })
    }

    pub fn service_id(&self) -> &[u8; SERVICE_ID_LEN] {
        &self.service_id
    }

    /// Canonical uppercase base32 form, without suffix
    pub fn as_base32(&self) -> &str {
        &self.base32
    }

    /// Descriptor identifier for `replica` at the current wall-clock time
    pub fn descriptor_id(&self, replica: u8) -> DescriptorId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.descriptor_id_at(replica, now)
    }

    /// Descriptor identifier for `replica` at the given unix time.
    ///
    /// `t` buckets time into rotation periods, shifted by the first service
    /// identifier byte; the identifier is SHA1(service-id ‖ SHA1(t ‖ replica)).
    pub fn descriptor_id_at(&self, replica: u8, unix_seconds: u64) -> DescriptorId {
        let oid = u64::from(self.service_id[0]);
        let t = (unix_seconds + oid * ROTATION_PERIOD_SECS / 256) / ROTATION_PERIOD_SECS;

        let mut time_hash = Sha1::new();
        time_hash.update((t as u32).to_be_bytes());
        time_hash.update([replica]);
        let hash_t = time_hash.finalize();

        let mut outer = Sha1::new();
        outer.update(self.service_id);
        outer.update(hash_t);
        DescriptorId::from_bytes(outer.finalize().into())
    }
}

impl fmt::Display for OnionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.onion", self.base32.to_lowercase())
    }
}

impl FromStr for OnionAddress {
    type Err = HsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr_from_id(service_id: [u8; SERVICE_ID_LEN]) -> OnionAddress {
        let b32 = data_encoding::BASE32_NOPAD.encode(&service_id);
        OnionAddress::parse(&b32).unwrap()
    }

    #[test]
    fn parse_is_case_insensitive_and_strips_suffix() {
        let addr = addr_from_id([0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3, 4, 5]);
        let lower = format!("{}.onion", addr.as_base32().to_lowercase());
        let reparsed = OnionAddress::parse(&lower).unwrap();
        assert_eq!(addr, reparsed);
    }

    #[test]
    fn rejects_wrong_decoded_length() {
        // 20 bytes of service id instead of 10
        let b32 = data_encoding::BASE32_NOPAD.encode(&[1u8; 20]);
        let err = OnionAddress::parse(&b32).unwrap_err();
        assert!(matches!(err, HsError::MalformedAddress(_)));
    }

    #[test]
    fn rejects_invalid_base32() {
        let err = OnionAddress::parse("not!a*valid@onion").unwrap_err();
        assert!(matches!(err, HsError::MalformedAddress(_)));
    }

    #[test]
    fn descriptor_id_is_stable_within_a_period() {
        // first byte 0: no stagger offset, so 1e9 sits mid-bucket
        let addr = addr_from_id([0u8; SERVICE_ID_LEN]);
        let a = addr.descriptor_id_at(0, 1_000_000_000);
        let b = addr.descriptor_id_at(0, 1_000_000_001);
        assert_eq!(a, b);
    }

    #[test]
    fn descriptor_id_rotates_between_periods() {
        let addr = addr_from_id([0u8; SERVICE_ID_LEN]);
        let a = addr.descriptor_id_at(0, 1_000_000_000);
        let b = addr.descriptor_id_at(0, 1_000_000_000 + ROTATION_PERIOD_SECS);
        assert_ne!(a, b);
    }

    #[test]
    fn replicas_produce_distinct_ids() {
        let addr = addr_from_id([7u8; SERVICE_ID_LEN]);
        let a = addr.descriptor_id_at(0, 1_000_000_000);
        let b = addr.descriptor_id_at(1, 1_000_000_000);
        assert_ne!(a, b);
    }

    #[test]
    fn stagger_offset_depends_on_first_byte() {
        // near a period boundary, services with different first bytes land
        // in different buckets
        let zero = addr_from_id([0u8; SERVICE_ID_LEN]);
        let high = addr_from_id([0xffu8, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // 0xff staggers by 255*86400/256 = 86062 seconds, so that service's
        // bucket boundary falls 338 seconds into everyone else's period
        let base = 11574 * ROTATION_PERIOD_SECS;
        assert_eq!(
            zero.descriptor_id_at(0, base + 337),
            zero.descriptor_id_at(0, base + 338)
        );
        assert_ne!(
            high.descriptor_id_at(0, base + 337),
            high.descriptor_id_at(0, base + 338)
        );
    }
}

//! Parsed hidden-service descriptors.
//!
//! The descriptor fetched from a directory is a key/value document whose
//! `introduction-points` entry is itself a base64-wrapped nested document.
//! The nested document carries parallel `introduction-point` and
//! `service-key` entries; the arrays must stay index-aligned.

use crate::docparser::NetDocument;
use data_encoding::BASE64;
use rendnet_common::HsError;

/// One introduction point advertised by a hidden service
#[derive(Debug, Clone)]
pub struct IntroPointEntry {
    /// Relay identity, base32-encoded as published in the descriptor
    pub identity_b32: String,

    /// DER-encoded PKCS#1 service key for this introduction point
    pub service_key_der: Vec<u8>,
}

/// A parsed v2 hidden-service descriptor
#[derive(Debug, Clone)]
pub struct HsDescriptor {
    intro_points: Vec<IntroPointEntry>,
}

impl HsDescriptor {
    pub fn parse(text: &str) -> Result<Self, HsError> {
        let outer = NetDocument::parse(text)
            .map_err(|err| HsError::invariant(format!("descriptor parse: {err}")))?;

        let encoded = outer
            .get("introduction-points")
            .ok_or_else(|| HsError::invariant("descriptor missing introduction-points"))?;
        let nested = BASE64
            .decode(encoded.as_bytes())
            .map_err(|err| HsError::invariant(format!("introduction-points base64: {err}")))?;
        let nested = String::from_utf8(nested)
            .map_err(|_| HsError::invariant("introduction-points is not valid UTF-8"))?;

        let intro_doc = NetDocument::parse(&nested)
            .map_err(|err| HsError::invariant(format!("introduction-points parse: {err}")))?;

        let identities = intro_doc.values("introduction-point");
        let keys = intro_doc.values("service-key");
        if identities.len() != keys.len() {
            return Err(HsError::invariant(format!(
                "{} introduction points but {} service keys",
                identities.len(),
                keys.len()
            )));
        }

        let mut intro_points = Vec::with_capacity(identities.len());
        for (identity, key_b64) in identities.into_iter().zip(keys) {
            let service_key_der = BASE64
                .decode(key_b64.as_bytes())
                .map_err(|err| HsError::invariant(format!("service-key base64: {err}")))?;
            intro_points.push(IntroPointEntry {
                identity_b32: identity.to_string(),
                service_key_der,
            });
        }

        Ok(Self { intro_points })
    }

    pub fn intro_points(&self) -> &[IntroPointEntry] {
        &self.intro_points
    }

    pub fn intro_point(&self, index: usize) -> Option<&IntroPointEntry> {
        self.intro_points.get(index)
    }
}

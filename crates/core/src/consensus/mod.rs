//! Read-only view of the relay consensus.
//!
//! Consensus fetching and document parsing are owned by an external
//! collaborator; this module only defines the snapshot handle the
//! hidden-service core consumes. Lookups take an explicit snapshot so
//! directory-ring results are deterministic for the duration of a call.

use rendnet_common::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Consensus flags assigned to relays by the directory authorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayFlag {
    Exit,
    Fast,
    Guard,
    /// Eligible to store and serve hidden-service descriptors
    HsDir,
    Running,
    Stable,
    Valid,
}

/// A single relay as listed in the consensus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relay {
    pub fingerprint: Fingerprint,
    pub nickname: String,
    pub address: Ipv4Addr,
    pub or_port: u16,
    pub dir_port: u16,
    /// DER-encoded PKCS#1 RSA onion key from the relay descriptor
    pub onion_key: Vec<u8>,
    pub flags: HashSet<RelayFlag>,
}

impl Relay {
    pub fn has_flag(&self, flag: RelayFlag) -> bool {
        self.flags.contains(&flag)
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.nickname, self.fingerprint)
    }
}

/// An immutable consensus snapshot, keyed by lowercase fingerprint hex.
///
/// The `BTreeMap` keeps relays in ascending fingerprint order, which is
/// exactly the ordering of the hidden-service directory ring.
#[derive(Debug, Clone, Default)]
pub struct ConsensusSnapshot {
    relays: BTreeMap<String, Arc<Relay>>,
}

impl ConsensusSnapshot {
    pub fn new(relays: impl IntoIterator<Item = Relay>) -> Self {
        Self {
            relays: relays
                .into_iter()
                .map(|relay| (relay.fingerprint.to_hex(), Arc::new(relay)))
                .collect(),
        }
    }

    /// Look up a relay by fingerprint hex (case-insensitive)
    pub fn relay(&self, fingerprint_hex: &str) -> Option<&Arc<Relay>> {
        self.relays.get(&fingerprint_hex.to_lowercase())
    }

    /// All relays carrying `flag`, in ascending fingerprint order
    pub fn relays_with_flag(&self, flag: RelayFlag) -> BTreeMap<String, Arc<Relay>> {
        self.relays
            .iter()
            .filter(|(_, relay)| relay.has_flag(flag))
            .map(|(fp, relay)| (fp.clone(), Arc::clone(relay)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }
}

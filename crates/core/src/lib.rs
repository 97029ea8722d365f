//! Client-side rendezvous protocol for v2 onion services.
//!
//! The modules here cover the four protocol stages: computing rotating
//! descriptor identifiers ([`service::OnionAddress`]), locating responsible
//! directories on the consistent-hash ring ([`service::responsible_directories`]),
//! exchanging descriptors over one-hop directory circuits
//! ([`service::fetch_descriptor`] and friends), and driving the encrypted
//! INTRODUCE1 handshake ([`service::send_introduce`]).
//!
//! Circuit construction and relay-cell crypto live behind the traits in
//! [`circuit`]; consensus data is passed in as an explicit
//! [`consensus::ConsensusSnapshot`] so lookups never depend on ambient state.

pub mod circuit;
pub mod consensus;
pub mod crypto;
pub mod docparser;
pub mod service;

#[cfg(test)]
pub(crate) mod testkit;

pub use circuit::{Circuit, CircuitError, CircuitLauncher, CircuitState, DirectoryStream};
pub use consensus::{ConsensusSnapshot, Relay, RelayFlag};
pub use crypto::{
    hybrid_decrypt, hybrid_encrypt, parse_service_key, CryptoError, TapClientHandshake,
};
pub use docparser::{DocParseError, NetDocument};
pub use service::{
    descriptor_by_id, fetch_descriptor, publish_descriptor, responsible_directories,
    responsible_directories_at, send_introduce, HsDescriptor, IntroPointEntry, OnionAddress,
};

//! Cryptography for the introduction handshake.
//!
//! `hybrid` implements the legacy hybrid public-key encryption used to seal
//! the INTRODUCE1 inner handshake under the service key; `dh` implements the
//! ephemeral Diffie-Hellman half of the rendezvous key exchange.

mod dh;
mod hybrid;

pub use dh::TapClientHandshake;
pub use hybrid::{hybrid_decrypt, hybrid_encrypt, parse_service_key, CryptoError};

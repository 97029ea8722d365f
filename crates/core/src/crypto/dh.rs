//! Ephemeral Diffie-Hellman for the rendezvous key exchange.
//!
//! Fixed 1024-bit MODP group (RFC 2409 Oakley group 2), generator 2. The
//! client generates a fresh keypair per introduction attempt; the public
//! value rides inside the INTRODUCE1 handshake and the private exponent is
//! handed to the rendezvous circuit to derive keys once the service
//! connects back. Reusing an exponent across attempts would break forward
//! secrecy, so [`TapClientHandshake`] offers no way to restore one.

use num_bigint_dig::BigUint;
use rand::RngCore;
use rendnet_common::protocol::handshake::DH_LEN;

/// RFC 2409 Oakley group 2 prime
const DH_PRIME_HEX: &[u8] = b"FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74\
020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437\
4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE65381FFFFFFFFFFFFFFFF";

const DH_GENERATOR: u32 = 2;

fn dh_prime() -> BigUint {
    // static constant, cannot fail
    BigUint::parse_bytes(DH_PRIME_HEX, 16).expect("valid group 2 modulus")
}

/// One side of the rendezvous Diffie-Hellman exchange.
///
/// This is the cross-circuit handoff value: generated while talking to the
/// introduction point, consumed by the rendezvous circuit.
pub struct TapClientHandshake {
    x: BigUint,
    public: [u8; DH_LEN],
}

impl TapClientHandshake {
    /// Generate a fresh ephemeral keypair
    pub fn generate(rng: &mut (impl RngCore + ?Sized)) -> Self {
        let mut secret = [0u8; DH_LEN];
        rng.fill_bytes(&mut secret);

        let x = BigUint::from_bytes_be(&secret);
        let public = to_fixed(BigUint::from(DH_GENERATOR).modpow(&x, &dh_prime()));
        Self { x, public }
    }

    /// g^x, serialized big-endian to the fixed wire width
    pub fn public(&self) -> &[u8; DH_LEN] {
        &self.public
    }

    /// g^xy given the peer's public value
    pub fn shared_secret(&self, peer_public: &[u8]) -> [u8; DH_LEN] {
        let peer = BigUint::from_bytes_be(peer_public);
        to_fixed(peer.modpow(&self.x, &dh_prime()))
    }
}

impl std::fmt::Debug for TapClientHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the exponent
        write!(f, "TapClientHandshake({} byte public)", DH_LEN)
    }
}

/// Left-pad a group element to the fixed wire width
fn to_fixed(value: BigUint) -> [u8; DH_LEN] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; DH_LEN];
    out[DH_LEN - bytes.len()..].copy_from_slice(&bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_keypairs_differ() {
        let mut rng = rand::thread_rng();
        let a = TapClientHandshake::generate(&mut rng);
        let b = TapClientHandshake::generate(&mut rng);
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn shared_secret_is_symmetric() {
        let mut rng = rand::thread_rng();
        let a = TapClientHandshake::generate(&mut rng);
        let b = TapClientHandshake::generate(&mut rng);

        assert_eq!(a.shared_secret(b.public()), b.shared_secret(a.public()));
    }

    #[test]
    fn public_value_stays_in_group() {
        let mut rng = rand::thread_rng();
        let a = TapClientHandshake::generate(&mut rng);
        let value = BigUint::from_bytes_be(a.public());
        assert!(value < dh_prime());
    }
}

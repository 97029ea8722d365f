//! The INTRODUCE1 handshake.
//!
//! Fetches and parses the service descriptor, builds a one-hop circuit to
//! the first advertised introduction point, and sends the hybrid-encrypted
//! introduction request naming the caller's rendezvous point. The ephemeral
//! Diffie-Hellman keypair generated here is returned to the caller: the
//! secret belongs to the *rendezvous* circuit, which needs it to derive keys
//! once the service connects back. No retries happen at this layer.

use crate::circuit::{Circuit, CircuitLauncher, CircuitState};
use crate::consensus::{ConsensusSnapshot, Relay};
use crate::crypto::{self, TapClientHandshake};
use crate::service::{directory, HsDescriptor, OnionAddress};
use data_encoding::BASE32_NOPAD;
use rendnet_common::protocol::handshake::{RELAY_COMMAND_INTRODUCE1, REND_COOKIE_LEN, VERSION};
use rendnet_common::{HsError, FINGERPRINT_LEN};
use sha1::{Digest, Sha1};
use tracing::debug;

/// Introduce ourselves to `onion` through its first introduction point,
/// asking it to meet us at `rendezvous`'s last hop.
///
/// Blocks until the introduction is acknowledged and the rendezvous circuit
/// reports completion. The introduction circuit is destroyed as soon as its
/// part is over. On success the fresh Diffie-Hellman key material is
/// returned for the rendezvous circuit to consume.
pub async fn send_introduce<L, R>(
    launcher: &L,
    snapshot: &ConsensusSnapshot,
    onion: &OnionAddress,
    rendezvous: &mut R,
) -> Result<TapClientHandshake, HsError>
where
    L: CircuitLauncher,
    R: Circuit,
{
    debug!(%onion, "fetching hidden-service descriptor");
    let descriptor_text = directory::fetch_descriptor(launcher, snapshot, onion)
        .await?
        .ok_or_else(|| HsError::circuit("hidden-service descriptor not found"))?;

    let rendz_relay = rendezvous
        .last_hop()
        .cloned()
        .ok_or_else(|| HsError::circuit("rendezvous circuit has no last hop"))?;
    let cookie = *rendezvous
        .rendezvous_cookie()
        .ok_or_else(|| HsError::invariant("rendezvous circuit has no cookie"))?;

    let descriptor = HsDescriptor::parse(&descriptor_text)?;
    let entry = descriptor
        .intro_point(0)
        .ok_or_else(|| HsError::invariant("descriptor lists no introduction points"))?;

    // intro point identities are base32 over the 20-byte relay identity
    let identity = BASE32_NOPAD
        .decode(entry.identity_b32.to_uppercase().as_bytes())
        .map_err(|_| HsError::IntroductionPointUnknown(entry.identity_b32.clone()))?;
    let identity_hex = hex::encode(&identity);
    let intro_relay = snapshot
        .relay(&identity_hex)
        .cloned()
        .ok_or(HsError::IntroductionPointUnknown(identity_hex))?;

    let sk_hash = Sha1::digest(&entry.service_key_der);
    if sk_hash.len() != FINGERPRINT_LEN {
        return Err(HsError::invariant("service key hash is not 20 bytes"));
    }
    let service_key = crypto::parse_service_key(&entry.service_key_der)
        .map_err(|err| HsError::invariant(err.to_string()))?;

    let dh = TapClientHandshake::generate(&mut rand::thread_rng());
    let inner = build_inner_handshake(&rendz_relay, &cookie, dh.public());
    let encrypted = crypto::hybrid_encrypt(&service_key, &inner)
        .map_err(|err| HsError::invariant(err.to_string()))?;

    let mut payload = Vec::with_capacity(sk_hash.len() + encrypted.len());
    payload.extend_from_slice(&sk_hash);
    payload.extend_from_slice(&encrypted);

    debug!(intro = %intro_relay, "building introduction circuit");
    let mut intro_circuit = launcher.open_circuit().await?;
    let outcome = introduce_on_circuit(&mut intro_circuit, &intro_relay, &payload).await;
    // the introduction circuit has served its purpose either way
    intro_circuit.destroy().await;
    outcome?;

    debug!("waiting for rendezvous completion");
    rendezvous
        .wait_for_state(CircuitState::RendezvousComplete, false)
        .await?;

    debug!(%onion, "hidden service rendezvous established");
    Ok(dh)
}

async fn introduce_on_circuit<C: Circuit>(
    circuit: &mut C,
    intro_relay: &Relay,
    payload: &[u8],
) -> Result<(), HsError> {
    circuit.create().await?;
    circuit.extend(intro_relay).await?;
    circuit
        .send(payload, RELAY_COMMAND_INTRODUCE1, false, 0)
        .await?;

    debug!("waiting for introduce acknowledgement");
    circuit
        .wait_for_state(CircuitState::Introduced, false)
        .await?;
    Ok(())
}

/// Serialize the plaintext handshake naming the rendezvous point:
/// version, IPv4 address, OR port, identity, onion key (length-prefixed),
/// rendezvous cookie, ephemeral DH public value.
fn build_inner_handshake(
    rendz: &Relay,
    cookie: &[u8; REND_COOKIE_LEN],
    dh_public: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        1 + 4 + 2 + FINGERPRINT_LEN + 2 + rendz.onion_key.len() + cookie.len() + dh_public.len(),
    );
    buf.push(VERSION);
    buf.extend_from_slice(&rendz.address.octets());
    buf.extend_from_slice(&rendz.or_port.to_be_bytes());
    buf.extend_from_slice(rendz.fingerprint.as_bytes());
    buf.extend_from_slice(&(rendz.onion_key.len() as u16).to_be_bytes());
    buf.extend_from_slice(&rendz.onion_key);
    buf.extend_from_slice(cookie);
    buf.extend_from_slice(dh_public);
    buf
}

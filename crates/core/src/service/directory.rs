//! Hidden-service directory selection and descriptor exchange.
//!
//! Descriptor responsibility is assigned by consistent hashing: HSDir-flagged
//! relays form a ring in ascending fingerprint-hex order, and each descriptor
//! replica belongs to the three ring-successors of its identifier. Fetching
//! walks those candidates in ring order, one dedicated one-hop directory
//! circuit per attempt; targeted requests go to a single caller-specified
//! directory instead.

use crate::circuit::{Circuit, CircuitLauncher, CircuitState, DirectoryStream};
use crate::consensus::{ConsensusSnapshot, Relay, RelayFlag};
use crate::service::OnionAddress;
use rendnet_common::protocol::descriptor::{REPLICA_COUNT, RING_SPREAD};
use rendnet_common::protocol::DIR_RESPONSE_TIMEOUT;
use rendnet_common::{DescriptorId, HsError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Host header presented on directory streams
const DIR_HOST: &str = "dirreq";

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Directories responsible for `onion`'s descriptor right now.
///
/// Up to six relays: three ring-successors per replica, replica-major, in
/// ring order. Rings smaller than three produce repeats rather than errors.
pub fn responsible_directories(
    snapshot: &ConsensusSnapshot,
    onion: &OnionAddress,
) -> Result<Vec<Arc<Relay>>, HsError> {
    responsible_directories_at(snapshot, onion, now_unix())
}

/// [`responsible_directories`] at an explicit unix time
pub fn responsible_directories_at(
    snapshot: &ConsensusSnapshot,
    onion: &OnionAddress,
    unix_seconds: u64,
) -> Result<Vec<Arc<Relay>>, HsError> {
    let ring = snapshot.relays_with_flag(RelayFlag::HsDir);
    if ring.is_empty() {
        return Err(HsError::NoDirectoriesAvailable);
    }

    let mut out = Vec::with_capacity(usize::from(REPLICA_COUNT) * RING_SPREAD);
    for replica in 0..REPLICA_COUNT {
        let target = onion.descriptor_id_at(replica, unix_seconds).to_hex();
        out.extend(ring_successors(&ring, &target));
    }
    Ok(out)
}

/// The `RING_SPREAD` relays at and after `target_hex` on the ring,
/// wrapping to the start past the end
fn ring_successors(ring: &BTreeMap<String, Arc<Relay>>, target_hex: &str) -> Vec<Arc<Relay>> {
    let keys: Vec<&String> = ring.keys().collect();
    let relays: Vec<&Arc<Relay>> = ring.values().collect();

    let start = keys.partition_point(|fp| fp.as_str() < target_hex);
    (0..RING_SPREAD)
        .map(|i| Arc::clone(relays[(start + i) % relays.len()]))
        .collect()
}

enum DirRequest<'a> {
    /// GET by computed descriptor identifier
    Fetch { descriptor_id: DescriptorId },

    /// GET by caller-supplied identifier text
    Get { descriptor_id: &'a str },

    /// POST a descriptor for storage
    Publish { descriptor: &'a str },
}

/// Fetch the descriptor for `onion`, trying each responsible directory in
/// ring order. Per-candidate circuit and HTTP failures advance to the next
/// candidate; exhausting every candidate yields `Ok(None)`.
pub async fn fetch_descriptor<L: CircuitLauncher>(
    launcher: &L,
    snapshot: &ConsensusSnapshot,
    onion: &OnionAddress,
) -> Result<Option<String>, HsError> {
    let now = now_unix();
    let candidates = responsible_directories_at(snapshot, onion, now)?;

    for (i, relay) in candidates.iter().enumerate() {
        let replica = (i / RING_SPREAD) as u8;
        let descriptor_id = onion.descriptor_id_at(replica, now);
        debug!(directory = %relay, replica, "requesting hidden-service descriptor");

        match perform_request(launcher, relay, &DirRequest::Fetch { descriptor_id }).await {
            Ok(body) => return Ok(Some(body)),
            Err(err @ (HsError::CircuitFailure(_) | HsError::UpstreamHttp { .. })) => {
                warn!(directory = %relay, error = %err, "descriptor request failed, trying next directory");
            }
            Err(err) => return Err(err),
        }
    }

    warn!(%onion, "hidden-service descriptor not found on any responsible directory");
    Ok(None)
}

/// Request a descriptor by identifier from one specific directory.
///
/// Unlike [`fetch_descriptor`] there is no candidate list to fall back on:
/// circuit failures and non-200 replies are surfaced to the caller, the
/// latter as [`HsError::UpstreamHttp`] carrying the raw response text.
pub async fn descriptor_by_id<L: CircuitLauncher>(
    launcher: &L,
    snapshot: &ConsensusSnapshot,
    descriptor_id: &str,
    fingerprint: &str,
) -> Result<String, HsError> {
    let relay = lookup_directory(snapshot, fingerprint)?;
    perform_request(launcher, &relay, &DirRequest::Get { descriptor_id }).await
}

/// Publish a descriptor to one specific directory. Same failure contract as
/// [`descriptor_by_id`].
pub async fn publish_descriptor<L: CircuitLauncher>(
    launcher: &L,
    snapshot: &ConsensusSnapshot,
    descriptor: &str,
    fingerprint: &str,
) -> Result<String, HsError> {
    let relay = lookup_directory(snapshot, fingerprint)?;
    perform_request(launcher, &relay, &DirRequest::Publish { descriptor }).await
}

fn lookup_directory(
    snapshot: &ConsensusSnapshot,
    fingerprint: &str,
) -> Result<Arc<Relay>, HsError> {
    snapshot
        .relay(fingerprint)
        .cloned()
        .ok_or_else(|| HsError::DirectoryNotFound(fingerprint.to_string()))
}

/// One request/response cycle over a dedicated directory circuit.
///
/// The circuit is destroyed exactly once on every exit path.
async fn perform_request<L: CircuitLauncher>(
    launcher: &L,
    relay: &Relay,
    request: &DirRequest<'_>,
) -> Result<String, HsError> {
    let mut circuit = launcher.open_circuit().await?;
    let result = drive_request(&mut circuit, relay, request).await;
    circuit.destroy().await;
    result
}

async fn drive_request<C: Circuit>(
    circuit: &mut C,
    relay: &Relay,
    request: &DirRequest<'_>,
) -> Result<String, HsError> {
    circuit.create().await?;
    circuit.extend(relay).await?;

    let mut stream = circuit.open_directory_stream().await?;
    match request {
        DirRequest::Fetch { descriptor_id } => {
            let path = format!("/tor/rendezvous2/{}", descriptor_id.to_base32());
            stream.send_http_get(&path, DIR_HOST).await?;
        }
        DirRequest::Get { descriptor_id } => {
            let path = format!("/tor/rendezvous2/{descriptor_id}");
            stream.send_http_get(&path, DIR_HOST).await?;
        }
        DirRequest::Publish { descriptor } => {
            stream
                .send_http_post("/tor/rendezvous2/publish", DIR_HOST, descriptor)
                .await?;
        }
    }

    // Whatever arrived within the window is the response; a directory that
    // stays quiet longer than this is treated as having nothing to say.
    let _ = timeout(DIR_RESPONSE_TIMEOUT, stream.closed()).await;

    if circuit.state() == CircuitState::Destroyed {
        debug!(directory = %relay, "circuit destroyed while waiting for directory response");
        return Err(HsError::circuit(
            "circuit destroyed while waiting for directory response",
        ));
    }

    let text = String::from_utf8_lossy(stream.buffered()).into_owned();
    parse_http_response(&text)
}

/// Split an HTTP response into status check and body
fn parse_http_response(text: &str) -> Result<String, HsError> {
    let status_line = text.lines().next().unwrap_or("");
    if status_line.split_whitespace().nth(1) != Some("200") {
        return Err(HsError::UpstreamHttp {
            response: text.to_string(),
        });
    }

    match text.split_once("\r\n\r\n") {
        Some((_, body)) => Ok(body.to_string()),
        None => Err(HsError::invariant("directory response missing body delimiter")),
    }
}

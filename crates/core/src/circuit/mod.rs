//! Interfaces onto the circuit and stream layer.
//!
//! Circuit construction, extension and relay-cell encryption are owned by an
//! external collaborator. The hidden-service core only drives circuits
//! through these traits: it opens a fresh circuit per request, observes
//! state transitions, and destroys the circuit on every exit path. Stream
//! completion is a single-shot future rather than a callback listener, so
//! request drivers can wait on it with a timeout.

use crate::consensus::Relay;
use rendnet_common::protocol::handshake::REND_COOKIE_LEN;
use rendnet_common::HsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Observable circuit states.
///
/// The core never transitions a circuit directly; it sends cells and waits
/// for the circuit layer to report the resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Circuit is being built
    Building,

    /// First hop established
    Created,

    /// Extended to the final hop
    CreatedAndExtended,

    /// Introduction point acknowledged our INTRODUCE1
    Introduced,

    /// The hidden service connected back at the rendezvous point
    RendezvousComplete,

    /// Circuit has been torn down
    Destroyed,
}

#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("circuit create failed: {0}")]
    CreateFailed(String),

    #[error("circuit extend failed: {0}")]
    ExtendFailed(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("circuit destroyed")]
    Destroyed,

    #[error("timed out waiting for circuit state {0:?}")]
    StateTimeout(CircuitState),
}

impl From<CircuitError> for HsError {
    fn from(err: CircuitError) -> Self {
        HsError::CircuitFailure(err.to_string())
    }
}

/// Opens fresh anonymizing circuits.
///
/// Every directory request and every introduction attempt owns a dedicated
/// circuit for its own lifetime; circuits are never pooled or reused here.
#[allow(async_fn_in_trait)]
pub trait CircuitLauncher {
    type Circuit: Circuit;

    async fn open_circuit(&self) -> Result<Self::Circuit, CircuitError>;
}

/// A multi-hop circuit driven by the hidden-service core
#[allow(async_fn_in_trait)]
pub trait Circuit {
    type Stream: DirectoryStream;

    /// Establish the first hop
    async fn create(&mut self) -> Result<(), CircuitError>;

    /// Extend the circuit by one hop to `relay`
    async fn extend(&mut self, relay: &Relay) -> Result<(), CircuitError>;

    /// Open a directory stream on this circuit
    async fn open_directory_stream(&mut self) -> Result<Self::Stream, CircuitError>;

    /// Send a relay cell carrying `payload`
    async fn send(
        &mut self,
        payload: &[u8],
        relay_command: u8,
        early: bool,
        stream_id: u16,
    ) -> Result<(), CircuitError>;

    /// Block until the circuit reaches `state` or fails
    async fn wait_for_state(
        &mut self,
        state: CircuitState,
        extended: bool,
    ) -> Result<(), CircuitError>;

    fn state(&self) -> CircuitState;

    /// Final hop of the circuit, once extended
    fn last_hop(&self) -> Option<&Relay>;

    /// Cookie presented at the rendezvous point. Only set on circuits that
    /// were opened to act as the client side of a rendezvous.
    fn rendezvous_cookie(&self) -> Option<&[u8; REND_COOKIE_LEN]>;

    /// Tear the circuit down. Idempotent at the circuit layer; the core
    /// invokes it exactly once per circuit.
    async fn destroy(&mut self);
}

/// An anonymous stream to a directory port.
///
/// The stream buffers everything the remote side sends and resolves
/// [`DirectoryStream::closed`] once the remote side ends the connection or
/// the stream fails.
#[allow(async_fn_in_trait)]
pub trait DirectoryStream {
    async fn send_http_get(&mut self, path: &str, host: &str) -> Result<(), CircuitError>;

    async fn send_http_post(
        &mut self,
        path: &str,
        host: &str,
        body: &str,
    ) -> Result<(), CircuitError>;

    /// Resolves once the stream reaches a terminal event. The response may
    /// be empty; callers inspect [`DirectoryStream::buffered`] afterwards.
    async fn closed(&mut self);

    /// Everything received before the stream closed
    fn buffered(&self) -> &[u8];
}

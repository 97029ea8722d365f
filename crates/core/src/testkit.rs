//! Scripted circuit and stream doubles for exercising the request drivers.

use crate::circuit::{Circuit, CircuitError, CircuitLauncher, CircuitState, DirectoryStream};
use crate::consensus::{ConsensusSnapshot, Relay, RelayFlag};
use rendnet_common::protocol::handshake::REND_COOKIE_LEN;
use rendnet_common::Fingerprint;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) fn test_relay(byte: u8, flags: &[RelayFlag]) -> Relay {
    Relay {
        fingerprint: Fingerprint::from_bytes([byte; 20]),
        nickname: format!("relay{byte}"),
        address: Ipv4Addr::new(10, 0, 0, byte),
        or_port: 9001,
        dir_port: 9030,
        onion_key: Vec::new(),
        flags: flags.iter().copied().collect(),
    }
}

pub(crate) fn hsdir_snapshot(bytes: &[u8]) -> ConsensusSnapshot {
    ConsensusSnapshot::new(
        bytes
            .iter()
            .map(|&b| test_relay(b, &[RelayFlag::HsDir, RelayFlag::Running])),
    )
}

#[derive(Debug, Clone)]
pub(crate) struct SentCell {
    pub payload: Vec<u8>,
    pub relay_command: u8,
    pub early: bool,
    pub stream_id: u16,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<String>,
}

/// Per-circuit script consumed by [`MockLauncher`] in open order
#[derive(Debug, Clone, Default)]
pub(crate) struct MockBehavior {
    fail_extend: bool,
    destroyed_mid_wait: bool,
    hang_stream: bool,
    fail_wait: bool,
    response: Option<Vec<u8>>,
}

impl MockBehavior {
    /// Stream closes with `text` buffered
    pub fn respond(text: &str) -> Self {
        Self {
            response: Some(text.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    /// Extending the circuit fails
    pub fn extend_failure() -> Self {
        Self {
            fail_extend: true,
            ..Self::default()
        }
    }

    /// The circuit reports `Destroyed` when checked after the wait
    pub fn destroyed_mid_wait() -> Self {
        Self {
            destroyed_mid_wait: true,
            ..Self::default()
        }
    }

    /// The stream never closes, forcing the response timeout
    pub fn hanging() -> Self {
        Self {
            hang_stream: true,
            ..Self::default()
        }
    }

    /// `wait_for_state` fails with a timeout
    pub fn wait_failure() -> Self {
        Self {
            fail_wait: true,
            ..Self::default()
        }
    }
}

#[derive(Default)]
pub(crate) struct MockLog {
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub sent_cells: Mutex<Vec<SentCell>>,
    pub extend_targets: Mutex<Vec<Fingerprint>>,
    destroy_counts: Mutex<Vec<Arc<AtomicUsize>>>,
}

impl MockLog {
    pub fn circuits_opened(&self) -> usize {
        self.destroy_counts.lock().unwrap().len()
    }

    pub fn assert_each_circuit_destroyed_once(&self) {
        for (i, count) in self.destroy_counts.lock().unwrap().iter().enumerate() {
            assert_eq!(count.load(Ordering::SeqCst), 1, "circuit {i} destroy count");
        }
    }
}

pub(crate) struct MockLauncher {
    scripts: Mutex<VecDeque<MockBehavior>>,
    pub log: Arc<MockLog>,
}

impl MockLauncher {
    pub fn new(scripts: Vec<MockBehavior>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            log: Arc::new(MockLog::default()),
        }
    }
}

impl CircuitLauncher for MockLauncher {
    type Circuit = MockCircuit;

    async fn open_circuit(&self) -> Result<MockCircuit, CircuitError> {
        let behavior = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        let destroys = Arc::new(AtomicUsize::new(0));
        self.log
            .destroy_counts
            .lock()
            .unwrap()
            .push(Arc::clone(&destroys));

        Ok(MockCircuit {
            behavior,
            state: CircuitState::Building,
            last_hop: None,
            cookie: None,
            log: Arc::clone(&self.log),
            destroys,
        })
    }
}

pub(crate) struct MockCircuit {
    behavior: MockBehavior,
    state: CircuitState,
    last_hop: Option<Relay>,
    cookie: Option<[u8; REND_COOKIE_LEN]>,
    log: Arc<MockLog>,
    destroys: Arc<AtomicUsize>,
}

impl MockCircuit {
    /// Stand-in for an already-built rendezvous circuit. Not tracked by the
    /// launcher log: the core does not own its teardown.
    pub fn rendezvous(relay: Relay, cookie: [u8; REND_COOKIE_LEN], log: Arc<MockLog>) -> Self {
        Self {
            behavior: MockBehavior::default(),
            state: CircuitState::CreatedAndExtended,
            last_hop: Some(relay),
            cookie: Some(cookie),
            log,
            destroys: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Like [`MockCircuit::rendezvous`] but with scripted behavior
    pub fn rendezvous_with(
        relay: Relay,
        cookie: [u8; REND_COOKIE_LEN],
        log: Arc<MockLog>,
        behavior: MockBehavior,
    ) -> Self {
        Self {
            behavior,
            ..Self::rendezvous(relay, cookie, log)
        }
    }
}

impl Circuit for MockCircuit {
    type Stream = MockStream;

    async fn create(&mut self) -> Result<(), CircuitError> {
        self.state = CircuitState::Created;
        Ok(())
    }

    async fn extend(&mut self, relay: &Relay) -> Result<(), CircuitError> {
        if self.behavior.fail_extend {
            return Err(CircuitError::ExtendFailed("scripted extend failure".into()));
        }
        self.log
            .extend_targets
            .lock()
            .unwrap()
            .push(relay.fingerprint);
        self.last_hop = Some(relay.clone());
        self.state = CircuitState::CreatedAndExtended;
        Ok(())
    }

    async fn open_directory_stream(&mut self) -> Result<MockStream, CircuitError> {
        Ok(MockStream {
            buffer: self.behavior.response.clone().unwrap_or_default(),
            hang: self.behavior.hang_stream,
            log: Arc::clone(&self.log),
        })
    }

    async fn send(
        &mut self,
        payload: &[u8],
        relay_command: u8,
        early: bool,
        stream_id: u16,
    ) -> Result<(), CircuitError> {
        self.log.sent_cells.lock().unwrap().push(SentCell {
            payload: payload.to_vec(),
            relay_command,
            early,
            stream_id,
        });
        Ok(())
    }

    async fn wait_for_state(
        &mut self,
        state: CircuitState,
        _extended: bool,
    ) -> Result<(), CircuitError> {
        if self.behavior.fail_wait {
            return Err(CircuitError::StateTimeout(state));
        }
        self.state = state;
        Ok(())
    }

    fn state(&self) -> CircuitState {
        if self.behavior.destroyed_mid_wait {
            CircuitState::Destroyed
        } else {
            self.state
        }
    }

    fn last_hop(&self) -> Option<&Relay> {
        self.last_hop.as_ref()
    }

    fn rendezvous_cookie(&self) -> Option<&[u8; REND_COOKIE_LEN]> {
        self.cookie.as_ref()
    }

    async fn destroy(&mut self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.state = CircuitState::Destroyed;
    }
}

pub(crate) struct MockStream {
    buffer: Vec<u8>,
    hang: bool,
    log: Arc<MockLog>,
}

impl DirectoryStream for MockStream {
    async fn send_http_get(&mut self, path: &str, _host: &str) -> Result<(), CircuitError> {
        self.log.requests.lock().unwrap().push(RecordedRequest {
            method: "GET",
            path: path.to_string(),
            body: None,
        });
        Ok(())
    }

    async fn send_http_post(
        &mut self,
        path: &str,
        _host: &str,
        body: &str,
    ) -> Result<(), CircuitError> {
        self.log.requests.lock().unwrap().push(RecordedRequest {
            method: "POST",
            path: path.to_string(),
            body: Some(body.to_string()),
        });
        Ok(())
    }

    async fn closed(&mut self) {
        if self.hang {
            std::future::pending::<()>().await;
        }
    }

    fn buffered(&self) -> &[u8] {
        &self.buffer
    }
}

//! Mocks shared by the client unit tests.

use crate::error::ClientError;
use crate::media::LocalMedia;
use crate::peer::{LinkEvent, PeerConnection, PeerConnector, SignalSender};
use crate::transport::{SignalingChannel, SignalingConnector};
use async_trait::async_trait;
use chorus_core::{ClientMessage, IceCandidate, ParticipantId, ServerMessage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Peer connection that answers every step instantly, naming SDP after its epoch.
pub struct MockConnection {
    epoch: u64,
    fail_offers: bool,
    fail_answers: bool,
    closed: AtomicBool,
    candidates: Mutex<Vec<String>>,
}

impl MockConnection {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn candidates(&self) -> Vec<String> {
        self.candidates.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn create_offer(&self) -> Result<String, ClientError> {
        if self.fail_offers {
            return Err(ClientError::Peer("offer failed".into()));
        }
        Ok(format!("offer-{}", self.epoch))
    }

    async fn accept_offer(&self, _sdp: String) -> Result<String, ClientError> {
        if self.fail_answers {
            return Err(ClientError::Peer("answer failed".into()));
        }
        Ok(format!("answer-{}", self.epoch))
    }

    async fn accept_answer(&self, _sdp: String) -> Result<(), ClientError> {
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), ClientError> {
        self.candidates.lock().unwrap().push(candidate.candidate);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    made: Arc<Mutex<Vec<Arc<MockConnection>>>>,
    fail_offers: Arc<AtomicBool>,
    fail_answers: Arc<AtomicBool>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_offers(&self, fail: bool) {
        self.fail_offers.store(fail, Ordering::SeqCst);
    }

    /// Connections made from now on fail to answer offers.
    pub fn fail_answers(&self, fail: bool) {
        self.fail_answers.store(fail, Ordering::SeqCst);
    }

    pub fn connections_made(&self) -> usize {
        self.made.lock().unwrap().len()
    }

    /// The `n`th connection created, in creation order.
    pub fn connection(&self, n: usize) -> Arc<MockConnection> {
        self.made.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl PeerConnector for MockConnector {
    async fn connect(
        &self,
        _remote: &ParticipantId,
        epoch: u64,
        _events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<Arc<dyn PeerConnection>, ClientError> {
        let connection = Arc::new(MockConnection {
            epoch,
            fail_offers: self.fail_offers.load(Ordering::SeqCst),
            fail_answers: self.fail_answers.load(Ordering::SeqCst),
            closed: AtomicBool::new(false),
            candidates: Mutex::new(Vec::new()),
        });
        self.made.lock().unwrap().push(connection.clone());
        Ok(connection)
    }
}

/// Captures every message handed to it.
#[derive(Default)]
pub struct RecordingSignals {
    sent: Mutex<Vec<ClientMessage>>,
}

impl RecordingSignals {
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl SignalSender for RecordingSignals {
    fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// The far end of one in-memory signaling socket.
pub struct ServerEnd {
    pub from_client: mpsc::UnboundedReceiver<ClientMessage>,
    pub to_client: mpsc::UnboundedSender<ServerMessage>,
}

impl ServerEnd {
    pub async fn recv(&mut self) -> ClientMessage {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("client sent nothing")
            .expect("client closed the socket")
    }

    pub fn send(&self, message: ServerMessage) {
        self.to_client.send(message).unwrap();
    }
}

/// Hands out in-memory sockets; each `connect` either yields the next scripted
/// outcome or, when the script is empty, a fresh connected socket.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    refusals: Arc<Mutex<VecDeque<bool>>>,
    ends: Arc<Mutex<VecDeque<ServerEnd>>>,
    attempts: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` connection attempts fail.
    pub fn refuse_next(&self, n: usize) {
        let mut refusals = self.refusals.lock().unwrap();
        refusals.extend(std::iter::repeat_n(true, n));
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Server end of the oldest socket not yet taken.
    pub fn take_end(&self) -> Option<ServerEnd> {
        self.ends.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl SignalingConnector for MemoryConnector {
    async fn connect(&self) -> Result<SignalingChannel, ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refusals.lock().unwrap().pop_front().unwrap_or(false) {
            return Err(ClientError::Connection("refused".into()));
        }

        let (outbound, from_client) = mpsc::unbounded_channel();
        let (to_client, inbound) = mpsc::unbounded_channel();
        self.ends.lock().unwrap().push_back(ServerEnd {
            from_client,
            to_client,
        });
        Ok(SignalingChannel { outbound, inbound })
    }
}

/// Local media that is always available, or always denied.
#[derive(Default)]
pub struct StubMedia {
    pub denied: bool,
    pub acquired: AtomicBool,
    pub released: AtomicUsize,
}

#[async_trait]
impl LocalMedia for StubMedia {
    async fn acquire(&self) -> Result<(), ClientError> {
        if self.denied {
            return Err(ClientError::MediaAccessDenied(
                crate::error::MediaAccessCause::PermissionDenied,
            ));
        }
        self.acquired.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn set_mic(&self, _enabled: bool) {}

    async fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

use crate::error::ClientError;
use crate::peer::IceState;
use async_trait::async_trait;
use chorus_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything a peer connection or a spawned negotiation step reports back to the
/// orchestrator. `epoch` names the connection object the event came from and
/// `token` the negotiation step; events that no longer match are discarded.
#[derive(Debug)]
pub enum LinkEvent {
    IceStateChanged {
        remote: ParticipantId,
        epoch: u64,
        state: IceState,
    },
    LocalCandidate {
        remote: ParticipantId,
        epoch: u64,
        candidate: IceCandidate,
    },
    OfferCreated {
        remote: ParticipantId,
        epoch: u64,
        token: u64,
        result: Result<String, ClientError>,
    },
    AnswerCreated {
        remote: ParticipantId,
        epoch: u64,
        token: u64,
        result: Result<String, ClientError>,
    },
    AnswerApplied {
        remote: ParticipantId,
        epoch: u64,
        token: u64,
        result: Result<(), ClientError>,
    },
    /// No answer arrived for the offer sent under `token`.
    AnswerTimedOut {
        remote: ParticipantId,
        epoch: u64,
        token: u64,
    },
}

impl LinkEvent {
    pub fn remote(&self) -> &ParticipantId {
        match self {
            Self::IceStateChanged { remote, .. }
            | Self::LocalCandidate { remote, .. }
            | Self::OfferCreated { remote, .. }
            | Self::AnswerCreated { remote, .. }
            | Self::AnswerApplied { remote, .. }
            | Self::AnswerTimedOut { remote, .. } => remote,
        }
    }
}

/// One media session with one remote participant.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<String, ClientError>;

    /// Applies a remote offer and returns the answer, already installed locally.
    async fn accept_offer(&self, sdp: String) -> Result<String, ClientError>;

    async fn accept_answer(&self, sdp: String) -> Result<(), ClientError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), ClientError>;

    async fn close(&self);
}

/// Factory for peer connections. Implementations push connectivity changes and
/// local candidates into `events`, tagged with `epoch`.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(
        &self,
        remote: &ParticipantId,
        epoch: u64,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<Arc<dyn PeerConnection>, ClientError>;
}

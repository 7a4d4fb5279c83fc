use crate::peer::PeerConnection;
use chorus_core::{IceCandidate, ParticipantId};
use std::fmt;
use std::sync::Arc;

/// The two negotiation states a link can be observed in. An incoming offer is
/// answered straight away, so there is no "have-remote-offer" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
}

impl SignalingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::HaveLocalOffer => "have-local-offer",
        }
    }
}

/// Connectivity as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IceState {
    /// User-facing status for a remote participant.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New | Self::Checking => "connecting…",
            Self::Connected | Self::Completed => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Completed)
    }
}

impl fmt::Display for IceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitiatorRole {
    Offerer,
    Answerer,
}

impl InitiatorRole {
    /// The side whose id sorts lower offers; the other waits.
    pub fn for_pair(local: &ParticipantId, remote: &ParticipantId) -> Self {
        if local.offers_to(remote) {
            Self::Offerer
        } else {
            Self::Answerer
        }
    }
}

/// One negotiated connection to one remote participant.
pub struct PeerLink {
    pub local_id: ParticipantId,
    pub remote_id: ParticipantId,
    pub role: InitiatorRole,
    pub signaling_state: SignalingState,
    pub ice_state: IceState,
    /// Identifies the connection object; bumped whenever it is replaced.
    pub(crate) epoch: u64,
    /// Identifies the in-flight negotiation step on this connection.
    pub(crate) negotiation: u64,
    /// Re-offers made since the link last reached `connected`.
    pub(crate) attempts: u32,
    pub(crate) remote_description_set: bool,
    /// An `accept_offer` step is running on `connection`.
    pub(crate) answer_pending: bool,
    pub(crate) pending_candidates: Vec<IceCandidate>,
    pub(crate) connection: Arc<dyn PeerConnection>,
}

impl PeerLink {
    pub(crate) fn new(
        local_id: ParticipantId,
        remote_id: ParticipantId,
        epoch: u64,
        connection: Arc<dyn PeerConnection>,
    ) -> Self {
        Self {
            role: InitiatorRole::for_pair(&local_id, &remote_id),
            local_id,
            remote_id,
            signaling_state: SignalingState::Stable,
            ice_state: IceState::New,
            epoch,
            negotiation: 0,
            attempts: 0,
            remote_description_set: false,
            answer_pending: false,
            pending_candidates: Vec::new(),
            connection,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn label(&self) -> &'static str {
        self.ice_state.label()
    }

    pub fn buffered_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Whether a completion tagged with `epoch`/`token` still belongs to this link.
    pub(crate) fn is_current(&self, epoch: u64, token: u64) -> bool {
        self.epoch == epoch && self.negotiation == token
    }

    pub(crate) fn next_negotiation(&mut self) -> u64 {
        self.negotiation += 1;
        self.negotiation
    }
}

impl fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("local_id", &self.local_id)
            .field("remote_id", &self.remote_id)
            .field("role", &self.role)
            .field("signaling_state", &self.signaling_state)
            .field("ice_state", &self.ice_state)
            .field("epoch", &self.epoch)
            .finish()
    }
}

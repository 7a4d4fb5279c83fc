use crate::model::participant::ParticipantId;
use crate::model::room::RoomCode;
use serde::{Deserialize, Serialize};

/// A negotiation payload addressed from one participant to another inside a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage<P> {
    pub target_id: ParticipantId,
    pub from_id: ParticipantId,
    pub room_code: RoomCode,
    #[serde(flatten)]
    pub payload: P,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub sdp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

/// The three relayable signaling payloads, independent of direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Offer(SignalMessage<SessionDescription>),
    Answer(SignalMessage<SessionDescription>),
    IceCandidate(SignalMessage<IceCandidate>),
}

impl Signal {
    pub fn offer(from: ParticipantId, to: ParticipantId, room: RoomCode, sdp: String) -> Self {
        Self::Offer(SignalMessage {
            target_id: to,
            from_id: from,
            room_code: room,
            payload: SessionDescription { sdp },
        })
    }

    pub fn answer(from: ParticipantId, to: ParticipantId, room: RoomCode, sdp: String) -> Self {
        Self::Answer(SignalMessage {
            target_id: to,
            from_id: from,
            room_code: room,
            payload: SessionDescription { sdp },
        })
    }

    pub fn ice_candidate(
        from: ParticipantId,
        to: ParticipantId,
        room: RoomCode,
        candidate: IceCandidate,
    ) -> Self {
        Self::IceCandidate(SignalMessage {
            target_id: to,
            from_id: from,
            room_code: room,
            payload: candidate,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "ice-candidate",
        }
    }

    pub fn target_id(&self) -> &ParticipantId {
        match self {
            Self::Offer(m) | Self::Answer(m) => &m.target_id,
            Self::IceCandidate(m) => &m.target_id,
        }
    }

    pub fn from_id(&self) -> &ParticipantId {
        match self {
            Self::Offer(m) | Self::Answer(m) => &m.from_id,
            Self::IceCandidate(m) => &m.from_id,
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        match self {
            Self::Offer(m) | Self::Answer(m) => &m.room_code,
            Self::IceCandidate(m) => &m.room_code,
        }
    }

    /// Overwrites the claimed sender with the identity the server knows for the socket.
    pub fn stamped_from(mut self, from: ParticipantId) -> Self {
        match &mut self {
            Self::Offer(m) | Self::Answer(m) => m.from_id = from,
            Self::IceCandidate(m) => m.from_id = from,
        }
        self
    }
}

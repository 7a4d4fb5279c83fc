use crate::model::media::{MediaPatch, MediaState};
use crate::model::participant::{DisplayName, ParticipantId};
use crate::model::room::RoomCode;
use crate::model::signaling::{IceCandidate, SessionDescription, Signal, SignalMessage};
use serde::{Deserialize, Serialize};

/// Frames a client sends over its signaling socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "create-room", rename_all = "camelCase")]
    CreateRoom { display_name: String },

    #[serde(rename = "join-room", rename_all = "camelCase")]
    JoinRoom {
        room_code: String,
        display_name: String,
    },

    #[serde(rename = "leave-room", rename_all = "camelCase")]
    LeaveRoom { room_code: String },

    #[serde(rename = "offer")]
    Offer(SignalMessage<SessionDescription>),

    #[serde(rename = "answer")]
    Answer(SignalMessage<SessionDescription>),

    #[serde(rename = "ice-candidate")]
    IceCandidate(SignalMessage<IceCandidate>),

    #[serde(rename = "status:change")]
    StatusChange { media: MediaPatch },
}

impl ClientMessage {
    /// Splits relayable negotiation traffic from room-level requests.
    pub fn into_signal(self) -> Result<Signal, Self> {
        match self {
            Self::Offer(m) => Ok(Signal::Offer(m)),
            Self::Answer(m) => Ok(Signal::Answer(m)),
            Self::IceCandidate(m) => Ok(Signal::IceCandidate(m)),
            other => Err(other),
        }
    }
}

impl From<Signal> for ClientMessage {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Offer(m) => Self::Offer(m),
            Signal::Answer(m) => Self::Answer(m),
            Signal::IceCandidate(m) => Self::IceCandidate(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub id: ParticipantId,
    pub display_name: DisplayName,
    pub media: MediaState,
}

/// Frames the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "room-created", rename_all = "camelCase")]
    RoomCreated {
        room_code: RoomCode,
        participant_id: ParticipantId,
    },

    /// Join response; `members` never contains the joiner itself.
    #[serde(rename = "room-joined", rename_all = "camelCase")]
    RoomJoined {
        room_code: RoomCode,
        participant_id: ParticipantId,
        members: Vec<MemberInfo>,
    },

    #[serde(rename = "error")]
    Error { error: String },

    #[serde(rename = "user-joined")]
    UserJoined(MemberInfo),

    #[serde(rename = "user-left")]
    UserLeft { id: ParticipantId },

    #[serde(rename = "offer")]
    Offer(SignalMessage<SessionDescription>),

    #[serde(rename = "answer")]
    Answer(SignalMessage<SessionDescription>),

    #[serde(rename = "ice-candidate")]
    IceCandidate(SignalMessage<IceCandidate>),

    #[serde(rename = "status:update")]
    StatusUpdate { id: ParticipantId, media: MediaPatch },

    #[serde(rename = "force-disconnect")]
    ForceDisconnect { reason: String },
}

impl ServerMessage {
    pub fn into_signal(self) -> Result<Signal, Self> {
        match self {
            Self::Offer(m) => Ok(Signal::Offer(m)),
            Self::Answer(m) => Ok(Signal::Answer(m)),
            Self::IceCandidate(m) => Ok(Signal::IceCandidate(m)),
            other => Err(other),
        }
    }
}

impl From<Signal> for ServerMessage {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Offer(m) => Self::Offer(m),
            Signal::Answer(m) => Self::Answer(m),
            Signal::IceCandidate(m) => Self::IceCandidate(m),
        }
    }
}

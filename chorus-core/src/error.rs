use crate::model::{ParticipantId, RoomCode};
use thiserror::Error;

/// Room-level failures, returned synchronously to the requester.
/// The `Display` text is what goes out in the `error` frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,

    #[error("Room is full (max {capacity} users)")]
    Full { capacity: usize },

    #[error("Could not allocate a unique identifier")]
    IdentifierExhausted,
}

impl RoomError {
    /// Recovers the typed error from an `error` frame's text.
    pub fn from_wire(text: &str) -> Option<Self> {
        if text == "Room not found" {
            return Some(Self::NotFound);
        }
        if text == "Could not allocate a unique identifier" {
            return Some(Self::IdentifierExhausted);
        }
        let capacity = text
            .strip_prefix("Room is full (max ")?
            .strip_suffix(" users)")?
            .parse()
            .ok()?;
        Some(Self::Full { capacity })
    }
}

/// Protocol anomalies. These are expected under asynchronous mesh delivery and are
/// logged and dropped rather than surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalingError {
    #[error("{signal} not permitted in signaling state {state}")]
    InvalidSignalingState {
        signal: &'static str,
        state: &'static str,
    },

    #[error("no live peer {0}")]
    PeerNotFound(ParticipantId),

    #[error("signal addressed to room {got} but sender is in {expected}")]
    RoomMismatch { expected: RoomCode, got: RoomCode },

    #[error("sender is not in a room")]
    NotInRoom,
}

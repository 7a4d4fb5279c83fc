use chorus_core::{RoomError, SignalingError};
use std::fmt;
use thiserror::Error;

/// Why the microphone could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaAccessCause {
    PermissionDenied,
    DeviceMissing,
    Other(String),
}

impl fmt::Display for MediaAccessCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "microphone permission denied"),
            Self::DeviceMissing => write!(f, "no microphone found"),
            Self::Other(name) => write!(f, "microphone unavailable ({})", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Signaling(#[from] SignalingError),

    /// An `error` frame whose text is not a known room error.
    #[error("server error: {0}")]
    Server(String),

    #[error("{0}")]
    MediaAccessDenied(MediaAccessCause),

    #[error("signaling connection lost after {attempts} reconnect attempts")]
    TransportLost { attempts: u32 },

    #[error("could not rejoin room: {0}")]
    RejoinRejected(String),

    #[error("disconnected by server: {0}")]
    ForceDisconnected(String),

    #[error("not in a room")]
    NotInRoom,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("peer connection error: {0}")]
    Peer(String),
}

impl ClientError {
    /// Interprets the text of a server `error` frame.
    pub fn from_server(text: String) -> Self {
        match RoomError::from_wire(&text) {
            Some(room) => Self::Room(room),
            None => Self::Server(text),
        }
    }

    /// Errors after which the session stops for good.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::TransportLost { .. } | Self::RejoinRejected(_) | Self::ForceDisconnected(_)
        )
    }
}

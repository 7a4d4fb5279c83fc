use crate::signaling::ConnectionId;
use chorus_core::{ClientMessage, MemberInfo, RoomCode};
use tokio::sync::oneshot;

/// Events flowing from the signaling sockets into the room manager loop.
#[derive(Debug)]
pub enum RoomCommand {
    /// A parsed frame from a client socket.
    Message {
        connection_id: ConnectionId,
        message: ClientMessage,
    },

    /// The socket is gone; any room membership it held ends now.
    Disconnect { connection_id: ConnectionId },

    /// Best-effort: tell every socket to go away and drop all rooms.
    DisconnectAll { reason: String },

    /// Read-only view of the registry, answered in command order.
    Snapshot {
        reply: oneshot::Sender<Vec<RoomSnapshot>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub members: Vec<MemberInfo>,
}

use crate::signaling::ConnectionId;
use async_trait::async_trait;
use chorus_core::ServerMessage;

/// Implemented by whatever owns the client sockets, so the room manager can talk
/// back to clients without knowing the transport.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue a frame for one socket. Unknown sockets are logged and skipped.
    async fn send(&self, connection: ConnectionId, message: ServerMessage);

    /// Ask the socket to close after its queued frames.
    async fn close(&self, connection: ConnectionId);

    /// Every socket currently attached, whether or not it is in a room.
    fn connections(&self) -> Vec<ConnectionId>;
}

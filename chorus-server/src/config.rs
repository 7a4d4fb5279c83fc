use chorus_core::DEFAULT_ROOM_CAPACITY;
use std::net::SocketAddr;

/// Runtime settings for the signaling server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Hard cap on participants per room.
    pub max_room_size: usize,
    /// Collision retries when drawing a room code or participant id.
    pub max_id_attempts: usize,
    /// Capacity of the socket → room manager command channel.
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_room_size: DEFAULT_ROOM_CAPACITY,
            max_id_attempts: 32,
            command_buffer: 256,
        }
    }
}

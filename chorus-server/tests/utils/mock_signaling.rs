use async_trait::async_trait;
use chorus_core::ServerMessage;
use chorus_server::{ConnectionId, SignalingOutput};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame {
        connection: ConnectionId,
        message: ServerMessage,
    },
    Close {
        connection: ConnectionId,
    },
}

/// Mock SignalingOutput that captures every frame the room manager emits.
#[derive(Clone, Default)]
pub struct MockSignalingOutput {
    /// All captured output, in emission order.
    outbound: Arc<Mutex<Vec<Outbound>>>,
    /// Sockets considered attached (for `connections()`).
    attached: Arc<Mutex<Vec<ConnectionId>>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, connection: ConnectionId) {
        self.attached.lock().unwrap().push(connection);
    }

    /// Every frame sent to `connection`, in order.
    pub fn messages_for(&self, connection: ConnectionId) -> Vec<ServerMessage> {
        self.outbound
            .lock()
            .unwrap()
            .iter()
            .filter_map(|o| match o {
                Outbound::Frame {
                    connection: c,
                    message,
                } if *c == connection => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn all(&self) -> Vec<Outbound> {
        self.outbound.lock().unwrap().clone()
    }

    pub fn was_closed(&self, connection: ConnectionId) -> bool {
        self.outbound
            .lock()
            .unwrap()
            .iter()
            .any(|o| matches!(o, Outbound::Close { connection: c } if *c == connection))
    }

    pub fn clear(&self) {
        self.outbound.lock().unwrap().clear();
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, connection: ConnectionId, message: ServerMessage) {
        tracing::debug!("[MockSignaling] send to {}: {:?}", connection, message);
        self.outbound.lock().unwrap().push(Outbound::Frame {
            connection,
            message,
        });
    }

    async fn close(&self, connection: ConnectionId) {
        self.outbound
            .lock()
            .unwrap()
            .push(Outbound::Close { connection });
    }

    fn connections(&self) -> Vec<ConnectionId> {
        self.attached.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signaling_captures_frames_per_connection() {
        let signaling = MockSignalingOutput::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        signaling
            .send(a, ServerMessage::Error { error: "x".into() })
            .await;
        signaling.close(b).await;

        assert_eq!(signaling.messages_for(a).len(), 1);
        assert!(signaling.messages_for(b).is_empty());
        assert!(signaling.was_closed(b));
    }
}

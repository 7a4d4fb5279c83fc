use crate::room::{RoomCommand, RoomSnapshot};
use crate::signaling::{ConnectionId, SignalingOutput};
use async_trait::async_trait;
use axum::extract::ws::Message;
use chorus_core::ServerMessage;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// Socket table shared between the axum handlers and the room manager.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) room_cmd_tx: mpsc::Sender<RoomCommand>,
}

impl SignalingService {
    pub fn new(room_cmd_tx: mpsc::Sender<RoomCommand>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
            }),
            room_cmd_tx,
        }
    }

    pub fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(connection_id, tx);
    }

    pub fn remove_connection(&self, connection_id: &ConnectionId) {
        self.inner.connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Room state as seen by the manager once every earlier command has been handled.
    pub async fn snapshot(&self) -> Option<Vec<RoomSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.room_cmd_tx
            .send(RoomCommand::Snapshot { reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    fn push(&self, connection_id: ConnectionId, frame: Message) {
        let Some(tx) = self.inner.connections.get(&connection_id) else {
            warn!("Attempted to send to disconnected socket {}", connection_id);
            return;
        };

        if let Err(e) = tx.send(frame) {
            error!("Failed to queue WS frame for {}: {:?}", connection_id, e);
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, connection: ConnectionId, message: ServerMessage) {
        match serde_json::to_string(&message) {
            Ok(json) => self.push(connection, Message::Text(json.into())),
            Err(e) => error!("Failed to serialize server message: {}", e),
        }
    }

    async fn close(&self, connection: ConnectionId) {
        self.push(connection, Message::Close(None));
    }

    fn connections(&self) -> Vec<ConnectionId> {
        self.inner
            .connections
            .iter()
            .map(|entry| *entry.key())
            .collect()
    }
}

use chorus_core::{
    ClientMessage, IceCandidate, MediaPatch, ParticipantId, RoomCode, ServerMessage, Signal,
};
use chorus_server::{ConnectionId, RoomCommand, RoomManager, RoomRegistry, RoomSnapshot, ServerConfig};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::mock_signaling::MockSignalingOutput;
use super::scripted_ids::ScriptedIds;

/// A running room manager wired to a capturing signaling output.
pub struct TestServer {
    pub cmd_tx: mpsc::Sender<RoomCommand>,
    pub signaling: MockSignalingOutput,
}

/// One simulated client socket.
#[derive(Debug, Clone)]
pub struct TestSocket {
    pub connection: ConnectionId,
    pub participant_id: ParticipantId,
    pub room_code: RoomCode,
}

impl TestServer {
    pub fn start(room_codes: &[&str]) -> Self {
        Self::start_with(ServerConfig::default(), room_codes)
    }

    pub fn start_with(config: ServerConfig, room_codes: &[&str]) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RoomCommand>(100);
        let signaling = MockSignalingOutput::new();
        let registry = RoomRegistry::with_ids(&config, Box::new(ScriptedIds::new(room_codes)));

        let manager = RoomManager::with_registry(registry, cmd_rx, Arc::new(signaling.clone()));
        tokio::spawn(async move {
            manager.run().await;
        });

        Self { cmd_tx, signaling }
    }

    pub fn connect(&self) -> ConnectionId {
        let connection = ConnectionId::new();
        self.signaling.attach(connection);
        connection
    }

    pub async fn send(&self, connection: ConnectionId, message: ClientMessage) {
        self.cmd_tx
            .send(RoomCommand::Message {
                connection_id: connection,
                message,
            })
            .await
            .expect("room manager stopped");
    }

    pub async fn disconnect(&self, connection: ConnectionId) {
        self.cmd_tx
            .send(RoomCommand::Disconnect {
                connection_id: connection,
            })
            .await
            .expect("room manager stopped");
    }

    /// Registry view after every previously sent command has been processed.
    pub async fn snapshot(&self) -> Vec<RoomSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(RoomCommand::Snapshot { reply })
            .await
            .expect("room manager stopped");
        rx.await.expect("snapshot reply dropped")
    }

    pub async fn room_size(&self, code: &str) -> Option<usize> {
        self.snapshot()
            .await
            .into_iter()
            .find(|r| r.code.as_str() == code)
            .map(|r| r.members.len())
    }

    pub async fn create_room(&self, name: &str) -> TestSocket {
        let connection = self.connect();
        self.send(
            connection,
            ClientMessage::CreateRoom {
                display_name: name.into(),
            },
        )
        .await;
        self.snapshot().await;

        match self.signaling.messages_for(connection).last() {
            Some(ServerMessage::RoomCreated {
                room_code,
                participant_id,
            }) => TestSocket {
                connection,
                participant_id: participant_id.clone(),
                room_code: room_code.clone(),
            },
            other => panic!("expected room-created, got {:?}", other),
        }
    }

    /// Joins and returns the socket plus the raw response frame.
    pub async fn join(&self, code: &str, name: &str) -> (ConnectionId, ServerMessage) {
        let connection = self.connect();
        self.send(
            connection,
            ClientMessage::JoinRoom {
                room_code: code.into(),
                display_name: name.into(),
            },
        )
        .await;
        self.snapshot().await;

        let response = self
            .signaling
            .messages_for(connection)
            .last()
            .cloned()
            .expect("no join response");
        (connection, response)
    }

    pub async fn join_ok(&self, code: &str, name: &str) -> TestSocket {
        match self.join(code, name).await {
            (
                connection,
                ServerMessage::RoomJoined {
                    room_code,
                    participant_id,
                    ..
                },
            ) => TestSocket {
                connection,
                participant_id,
                room_code,
            },
            (_, other) => panic!("expected room-joined, got {:?}", other),
        }
    }

    pub async fn set_media(&self, socket: &TestSocket, media: MediaPatch) {
        self.send(socket.connection, ClientMessage::StatusChange { media })
            .await;
        self.snapshot().await;
    }

    pub async fn offer(&self, from: &TestSocket, to: &ParticipantId, sdp: &str) {
        let signal = Signal::offer(
            from.participant_id.clone(),
            to.clone(),
            from.room_code.clone(),
            sdp.into(),
        );
        self.send(from.connection, signal.into()).await;
        self.snapshot().await;
    }

    pub async fn candidate(&self, from: &TestSocket, to: &ParticipantId, candidate: &str) {
        let signal = Signal::ice_candidate(
            from.participant_id.clone(),
            to.clone(),
            from.room_code.clone(),
            IceCandidate {
                candidate: candidate.into(),
                sdp_mid: Some("0".into()),
                sdp_m_line_index: Some(0),
            },
        );
        self.send(from.connection, signal.into()).await;
        self.snapshot().await;
    }
}

use crate::config::ServerConfig;
use crate::room::{RoomCommand, RoomRegistry, RoomSnapshot};
use crate::signaling::{ConnectionId, PresenceBroadcaster, SignalRelay, SignalingOutput};
use chorus_core::{ClientMessage, DisplayName, MediaPatch, ParticipantId, RoomCode, RoomError, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The room a socket currently belongs to, and under which id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_code: RoomCode,
    pub participant_id: ParticipantId,
}

/// Single event loop owning all room state. Every command is handled to completion
/// before the next one is read, so registry, relay and presence never interleave.
pub struct RoomManager {
    registry: RoomRegistry,
    memberships: HashMap<ConnectionId, Membership>,
    relay: SignalRelay,
    presence: PresenceBroadcaster,
    signaling: Arc<dyn SignalingOutput>,
    command_rx: mpsc::Receiver<RoomCommand>,
}

impl RoomManager {
    pub fn new(
        config: &ServerConfig,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self::with_registry(RoomRegistry::new(config), command_rx, signaling)
    }

    pub fn with_registry(
        registry: RoomRegistry,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry,
            memberships: HashMap::new(),
            relay: SignalRelay::new(signaling.clone()),
            presence: PresenceBroadcaster::new(signaling.clone()),
            signaling,
            command_rx,
        }
    }

    pub async fn run(mut self) {
        info!("Room manager loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Room manager loop finished");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Message {
                connection_id,
                message,
            } => self.handle_message(connection_id, message).await,

            RoomCommand::Disconnect { connection_id } => {
                debug!("Socket {} gone", connection_id);
                self.leave_current(connection_id).await;
            }

            RoomCommand::DisconnectAll { reason } => self.disconnect_all(reason).await,

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn handle_message(&mut self, connection_id: ConnectionId, message: ClientMessage) {
        let message = match message.into_signal() {
            Ok(signal) => {
                let Some(sender) = self.memberships.get(&connection_id) else {
                    warn!("Dropping {} from {}: not in a room", signal.kind(), connection_id);
                    return;
                };
                if let Err(e) = self.relay.relay(&self.registry, sender, signal).await {
                    warn!("Dropped signal from {}: {}", sender.participant_id, e);
                }
                return;
            }
            Err(other) => other,
        };

        match message {
            ClientMessage::CreateRoom { display_name } => {
                self.create_room(connection_id, &display_name).await
            }
            ClientMessage::JoinRoom {
                room_code,
                display_name,
            } => self.join_room(connection_id, &room_code, &display_name).await,
            ClientMessage::LeaveRoom { room_code } => self.leave_room(connection_id, &room_code).await,
            ClientMessage::StatusChange { media } => self.change_status(connection_id, media).await,
            ClientMessage::Offer(_) | ClientMessage::Answer(_) | ClientMessage::IceCandidate(_) => {}
        }
    }

    async fn create_room(&mut self, connection_id: ConnectionId, display_name: &str) {
        self.leave_current(connection_id).await;

        match self
            .registry
            .create_room(DisplayName::sanitize(display_name), connection_id)
        {
            Ok(created) => {
                self.memberships.insert(
                    connection_id,
                    Membership {
                        room_code: created.room_code.clone(),
                        participant_id: created.participant_id.clone(),
                    },
                );
                self.signaling
                    .send(
                        connection_id,
                        ServerMessage::RoomCreated {
                            room_code: created.room_code,
                            participant_id: created.participant_id,
                        },
                    )
                    .await;
            }
            Err(e) => self.reject(connection_id, e).await,
        }
    }

    async fn join_room(&mut self, connection_id: ConnectionId, raw_code: &str, display_name: &str) {
        self.leave_current(connection_id).await;

        let joined = match self.registry.join_room(
            raw_code,
            DisplayName::sanitize(display_name),
            connection_id,
        ) {
            Ok(joined) => joined,
            Err(e) => {
                info!("Join of {:?} by {} rejected: {}", raw_code, connection_id, e);
                return self.reject(connection_id, e).await;
            }
        };

        self.memberships.insert(
            connection_id,
            Membership {
                room_code: joined.room_code.clone(),
                participant_id: joined.participant_id.clone(),
            },
        );

        // Existing members hear about the joiner before the joiner learns who is
        // there, so any offer it sends finds a receiver that already knows it.
        if let Some(room) = self.registry.room(&joined.room_code) {
            self.presence
                .announce_join(room, &joined.participant_id)
                .await;
        }

        self.signaling
            .send(
                connection_id,
                ServerMessage::RoomJoined {
                    room_code: joined.room_code,
                    participant_id: joined.participant_id,
                    members: joined.members,
                },
            )
            .await;
    }

    async fn leave_room(&mut self, connection_id: ConnectionId, raw_code: &str) {
        let matches = self
            .memberships
            .get(&connection_id)
            .is_some_and(|m| RoomCode::parse(raw_code).as_ref() == Some(&m.room_code));

        if !matches {
            debug!("Ignoring leave-room {:?} from {}: not a member", raw_code, connection_id);
            return;
        }

        self.leave_current(connection_id).await;
    }

    /// Ends the socket's membership, if any. Safe to call repeatedly.
    async fn leave_current(&mut self, connection_id: ConnectionId) {
        let Some(membership) = self.memberships.remove(&connection_id) else {
            return;
        };

        let Some(departure) = self
            .registry
            .leave_room(&membership.room_code, &membership.participant_id)
        else {
            return;
        };

        info!(
            "{} ({}) left room {}",
            departure.participant.id, departure.participant.display_name, departure.room_code
        );

        if departure.room_closed {
            return;
        }

        if let Some(room) = self.registry.room(&departure.room_code) {
            self.presence
                .announce_leave(room, &departure.participant.id)
                .await;
        }
    }

    async fn change_status(&mut self, connection_id: ConnectionId, patch: MediaPatch) {
        let Some(membership) = self.memberships.get(&connection_id) else {
            debug!("Ignoring status change from {}: not in a room", connection_id);
            return;
        };

        let Some(changed) = self.registry.update_media(
            &membership.room_code,
            &membership.participant_id,
            patch,
        ) else {
            return;
        };

        if let Some(room) = self.registry.room(&membership.room_code) {
            self.presence
                .announce_media(room, &membership.participant_id, changed)
                .await;
        }
    }

    /// Fire-and-forget: no acknowledgement is awaited from any socket.
    async fn disconnect_all(&mut self, reason: String) {
        let connections = self.signaling.connections();
        info!(
            "Disconnecting {} sockets and {} rooms: {}",
            connections.len(),
            self.registry.room_count(),
            reason
        );

        for connection in connections {
            self.signaling
                .send(
                    connection,
                    ServerMessage::ForceDisconnect {
                        reason: reason.clone(),
                    },
                )
                .await;
            self.signaling.close(connection).await;
        }

        self.memberships.clear();
        self.registry.clear();
    }

    async fn reject(&self, connection_id: ConnectionId, error: RoomError) {
        self.signaling
            .send(
                connection_id,
                ServerMessage::Error {
                    error: error.to_string(),
                },
            )
            .await;
    }

    fn snapshot(&self) -> Vec<RoomSnapshot> {
        let mut rooms: Vec<_> = self
            .registry
            .rooms()
            .map(|room| RoomSnapshot {
                code: room.code().clone(),
                members: room.members(),
            })
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }
}

use crate::activity::{ActivityMonitor, EnergySource};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::media::LocalMedia;
use crate::peer::{
    IceState, LinkEvent, LinkStatus, OutboundSignals, PeerConnector, PeerLinkOrchestrator,
    SignalSender,
};
use crate::reconnect::ReconnectionSupervisor;
use crate::transport::{SignalingChannel, SignalingConnector};
use chorus_core::{ClientMessage, MediaPatch, MemberInfo, ParticipantId, RoomCode, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Requests from the application to the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    CreateRoom {
        display_name: String,
    },
    JoinRoom {
        room_code: String,
        display_name: String,
    },
    SetMedia(MediaPatch),
    Leave,
    Shutdown,
}

/// What the session reports back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    RoomCreated {
        room_code: RoomCode,
        participant_id: ParticipantId,
    },
    RoomJoined {
        room_code: RoomCode,
        participant_id: ParticipantId,
        members: Vec<MemberInfo>,
    },
    MemberJoined(MemberInfo),
    MemberLeft(ParticipantId),
    MediaChanged {
        id: ParticipantId,
        media: MediaPatch,
    },
    PeerStatus(LinkStatus),
    Speaking(bool),
    Disconnected,
    Reconnecting {
        attempt: u32,
    },
    /// Membership was replayed after a reconnect; ids are fresh.
    Rejoined {
        participant_id: ParticipantId,
        members: Vec<MemberInfo>,
    },
    Left,
    /// A request failed; the session carries on.
    Error(ClientError),
    /// The session has stopped.
    Terminated(ClientError),
}

/// Cloneable front end of a running [`ClientSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn create_room(&self, display_name: impl Into<String>) -> Result<(), ClientError> {
        self.send(SessionCommand::CreateRoom {
            display_name: display_name.into(),
        })
    }

    pub fn join_room(
        &self,
        room_code: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.send(SessionCommand::JoinRoom {
            room_code: room_code.into(),
            display_name: display_name.into(),
        })
    }

    pub fn set_media(&self, patch: MediaPatch) -> Result<(), ClientError> {
        self.send(SessionCommand::SetMedia(patch))
    }

    pub fn leave(&self) -> Result<(), ClientError> {
        self.send(SessionCommand::Leave)
    }

    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.send(SessionCommand::Shutdown)
    }

    fn send(&self, command: SessionCommand) -> Result<(), ClientError> {
        self.cmd_tx
            .send(command)
            .map_err(|_| ClientError::Connection("session stopped".into()))
    }
}

#[derive(Debug, Clone)]
struct Membership {
    room_code: RoomCode,
    participant_id: ParticipantId,
    display_name: String,
}

/// The request awaiting a `room-created` / `room-joined` / `error` reply.
#[derive(Debug)]
enum Pending {
    Create { display_name: String },
    Join { display_name: String },
    Rejoin,
}

type EnergySourceFactory = Box<dyn Fn() -> Box<dyn EnergySource> + Send + Sync>;

/// One participant's connection to the conference: a single task owning the
/// signaling socket, the peer links and the reconnection timer.
pub struct ClientSession {
    config: ClientConfig,
    connector: Arc<dyn SignalingConnector>,
    signals: Arc<OutboundSignals>,
    orchestrator: PeerLinkOrchestrator,
    supervisor: ReconnectionSupervisor,
    media: Arc<dyn LocalMedia>,
    energy_source: Option<EnergySourceFactory>,
    activity: Option<ActivityMonitor>,
    membership: Option<Membership>,
    pending: Option<Pending>,
    inbound: Option<mpsc::UnboundedReceiver<ServerMessage>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
    fire_rx: mpsc::UnboundedReceiver<u64>,
}

impl ClientSession {
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn SignalingConnector>,
        peers: Arc<dyn PeerConnector>,
        media: Arc<dyn LocalMedia>,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let signals = Arc::new(OutboundSignals::new());
        let (orchestrator, link_rx) = PeerLinkOrchestrator::new(
            peers,
            signals.clone(),
            config.max_negotiation_attempts,
            config.answer_timeout,
        );
        let (supervisor, fire_rx) =
            ReconnectionSupervisor::new(config.reconnect_delay, config.max_reconnect_attempts);

        let session = Self {
            config,
            connector,
            signals,
            orchestrator,
            supervisor,
            media,
            energy_source: None,
            activity: None,
            membership: None,
            pending: None,
            inbound: None,
            events,
            cmd_rx,
            link_rx,
            fire_rx,
        };
        (session, SessionHandle { cmd_tx }, events_rx)
    }

    /// Enables speaking detection while in a room.
    pub fn with_energy_source<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn EnergySource> + Send + Sync + 'static,
    {
        self.energy_source = Some(Box::new(factory));
        self
    }

    pub async fn run(mut self) {
        info!("Client session started");

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd).await {
                        break;
                    }
                }

                frame = recv_frame(&mut self.inbound) => match frame {
                    Some(message) => {
                        if let Err(e) = self.handle_server_message(message).await {
                            self.terminate(e).await;
                            break;
                        }
                    }
                    None => {
                        if let Err(e) = self.transport_lost() {
                            self.terminate(e).await;
                            break;
                        }
                    }
                },

                Some(event) = self.link_rx.recv() => {
                    if let Some(status) = self.orchestrator.handle_link_event(event).await {
                        self.emit(SessionEvent::PeerStatus(status));
                    }
                }

                Some(generation) = self.fire_rx.recv() => {
                    if let Err(e) = self.reconnect_tick(generation).await {
                        self.terminate(e).await;
                        break;
                    }
                }
            }
        }

        info!("Client session stopped");
    }

    /// Returns `false` when the session should stop.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::CreateRoom { display_name } => {
                let message = ClientMessage::CreateRoom {
                    display_name: display_name.clone(),
                };
                self.request(message, Pending::Create { display_name }).await;
            }
            SessionCommand::JoinRoom {
                room_code,
                display_name,
            } => {
                let message = ClientMessage::JoinRoom {
                    room_code,
                    display_name: display_name.clone(),
                };
                self.request(message, Pending::Join { display_name }).await;
            }
            SessionCommand::SetMedia(patch) => self.set_media(patch),
            SessionCommand::Leave => self.leave().await,
            SessionCommand::Shutdown => {
                self.leave().await;
                self.signals.detach();
                return false;
            }
        }
        true
    }

    async fn request(&mut self, message: ClientMessage, pending: Pending) {
        match self.try_send(message).await {
            Ok(()) => self.pending = Some(pending),
            Err(e) => {
                warn!("Request failed: {}", e);
                self.emit(SessionEvent::Error(e));
            }
        }
    }

    async fn try_send(&mut self, message: ClientMessage) -> Result<(), ClientError> {
        self.media.acquire().await?;
        self.ensure_connected().await?;
        self.signals.send(message)
    }

    async fn ensure_connected(&mut self) -> Result<(), ClientError> {
        if self.inbound.is_some() {
            return Ok(());
        }
        let channel = self.connector.connect().await?;
        self.attach(channel);
        Ok(())
    }

    fn attach(&mut self, channel: SignalingChannel) {
        self.signals.attach(channel.outbound);
        self.inbound = Some(channel.inbound);
        self.emit(SessionEvent::Connected);
    }

    /// An `Err` is terminal for the session.
    async fn handle_server_message(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        let message = match message.into_signal() {
            Ok(signal) => {
                let kind = signal.kind();
                if let Err(e) = self.orchestrator.handle_signal(signal).await {
                    warn!("Dropped {}: {}", kind, e);
                }
                return Ok(());
            }
            Err(other) => other,
        };

        match message {
            ServerMessage::RoomCreated {
                room_code,
                participant_id,
            } => {
                let Some(Pending::Create { display_name }) = self.pending.take() else {
                    warn!("Unsolicited room-created for {}", room_code);
                    return Ok(());
                };
                info!("Created room {} as {}", room_code, participant_id);
                self.orchestrator
                    .set_local(participant_id.clone(), room_code.clone())
                    .await;
                self.enter(room_code.clone(), participant_id.clone(), display_name);
                self.emit(SessionEvent::RoomCreated {
                    room_code,
                    participant_id,
                });
            }

            ServerMessage::RoomJoined {
                room_code,
                participant_id,
                members,
            } => self.joined(room_code, participant_id, members).await,

            ServerMessage::Error { error } => match self.pending.take() {
                Some(Pending::Rejoin) => return Err(ClientError::RejoinRejected(error)),
                Some(Pending::Create { .. } | Pending::Join { .. }) => {
                    // The server drops any previous membership before it tries the request.
                    self.leave_locally().await;
                    self.emit(SessionEvent::Error(ClientError::from_server(error)));
                }
                None => self.emit(SessionEvent::Error(ClientError::from_server(error))),
            },

            ServerMessage::UserJoined(info) => {
                if self.membership.is_none() {
                    return Ok(());
                }
                match self.orchestrator.ensure_link(&info.id).await {
                    Ok(true) => self.emit(SessionEvent::PeerStatus(LinkStatus::new(
                        info.id.clone(),
                        IceState::New,
                    ))),
                    Ok(false) => {}
                    Err(e) => error!("Could not open link to {}: {}", info.id, e),
                }
                self.emit(SessionEvent::MemberJoined(info));
            }

            ServerMessage::UserLeft { id } => {
                self.orchestrator.remove_link(&id).await;
                self.emit(SessionEvent::MemberLeft(id));
            }

            ServerMessage::StatusUpdate { id, media } => {
                self.emit(SessionEvent::MediaChanged { id, media });
            }

            ServerMessage::ForceDisconnect { reason } => {
                return Err(ClientError::ForceDisconnected(reason));
            }

            ServerMessage::Offer(_) | ServerMessage::Answer(_) | ServerMessage::IceCandidate(_) => {}
        }
        Ok(())
    }

    async fn joined(
        &mut self,
        room_code: RoomCode,
        participant_id: ParticipantId,
        members: Vec<MemberInfo>,
    ) {
        let present: Vec<_> = members.iter().map(|m| m.id.clone()).collect();

        match self.pending.take() {
            Some(Pending::Join { display_name }) => {
                info!("Joined room {} as {} ({} present)", room_code, participant_id, present.len());
                self.orchestrator
                    .rebuild(participant_id.clone(), room_code.clone(), &present)
                    .await;
                self.enter(room_code.clone(), participant_id.clone(), display_name);
                self.emit(SessionEvent::RoomJoined {
                    room_code,
                    participant_id,
                    members,
                });
                self.emit_link_statuses();
            }

            Some(Pending::Rejoin) => {
                let Some(membership) = self.membership.as_mut() else {
                    return;
                };
                info!("Rejoined room {} as {}", room_code, participant_id);
                self.supervisor.recovered();
                membership.room_code = room_code.clone();
                membership.participant_id = participant_id.clone();
                self.orchestrator
                    .rebuild(participant_id.clone(), room_code, &present)
                    .await;
                self.emit(SessionEvent::Rejoined {
                    participant_id,
                    members,
                });
                self.emit_link_statuses();
            }

            other => {
                warn!("Unsolicited room-joined for {}", room_code);
                self.pending = other;
            }
        }
    }

    fn enter(&mut self, room_code: RoomCode, participant_id: ParticipantId, display_name: String) {
        self.membership = Some(Membership {
            room_code,
            participant_id,
            display_name,
        });
        self.start_activity();
    }

    fn emit_link_statuses(&self) {
        for remote in self.orchestrator.remote_ids() {
            if let Some(link) = self.orchestrator.link(&remote) {
                self.emit(SessionEvent::PeerStatus(LinkStatus::new(remote, link.ice_state)));
            }
        }
    }

    fn set_media(&mut self, patch: MediaPatch) {
        if self.membership.is_none() {
            self.emit(SessionEvent::Error(ClientError::NotInRoom));
            return;
        }
        if let Some(mic) = patch.mic {
            self.media.set_mic(mic);
        }
        if let Err(e) = self.signals.send(ClientMessage::StatusChange { media: patch }) {
            warn!("Status change not sent: {}", e);
        }
    }

    async fn leave(&mut self) {
        if let Some(membership) = &self.membership {
            let leave = ClientMessage::LeaveRoom {
                room_code: membership.room_code.to_string(),
            };
            if let Err(e) = self.signals.send(leave) {
                debug!("leave-room not sent: {}", e);
            }
        }
        if self.leave_locally().await {
            self.emit(SessionEvent::Left);
        }
    }

    /// Tears down links, media and timers. Returns whether a membership was held.
    async fn leave_locally(&mut self) -> bool {
        self.supervisor.recovered();
        self.pending = None;
        self.activity = None;
        self.orchestrator.reset().await;
        self.media.release().await;
        self.membership.take().is_some()
    }

    /// An `Err` means the reconnect budget is spent.
    fn transport_lost(&mut self) -> Result<(), ClientError> {
        warn!("Signaling connection lost");
        self.inbound = None;
        self.signals.detach();
        self.emit(SessionEvent::Disconnected);

        if let Some(Pending::Create { .. } | Pending::Join { .. }) = self.pending.take() {
            self.emit(SessionEvent::Error(ClientError::Connection(
                "signaling connection lost before the server replied".into(),
            )));
        }

        if self.membership.is_none() {
            return Ok(());
        }
        if self.supervisor.attempts() > 0 {
            // The last attempt reached the server but never got back into the room.
            self.supervisor.attempt_failed()
        } else {
            self.supervisor.schedule();
            Ok(())
        }
    }

    async fn reconnect_tick(&mut self, generation: u64) -> Result<(), ClientError> {
        let Some(attempt) = self.supervisor.fire(generation) else {
            return Ok(());
        };
        if self.inbound.is_some() || self.membership.is_none() {
            self.supervisor.recovered();
            return Ok(());
        }

        self.emit(SessionEvent::Reconnecting { attempt });
        match self.connector.connect().await {
            Ok(channel) => {
                self.attach(channel);
                self.rejoin();
                Ok(())
            }
            Err(e) => {
                warn!("Reconnect attempt {} failed: {}", attempt, e);
                self.supervisor.attempt_failed()
            }
        }
    }

    /// Replays the join under the same display name; the server hands out a new id.
    fn rejoin(&mut self) {
        let Some(membership) = &self.membership else {
            return;
        };
        info!("Rejoining {} as {}", membership.room_code, membership.display_name);

        let join = ClientMessage::JoinRoom {
            room_code: membership.room_code.to_string(),
            display_name: membership.display_name.clone(),
        };
        match self.signals.send(join) {
            Ok(()) => self.pending = Some(Pending::Rejoin),
            Err(e) => warn!("Rejoin not sent: {}", e),
        }
    }

    fn start_activity(&mut self) {
        if self.activity.as_ref().is_some_and(ActivityMonitor::is_running) {
            return;
        }
        let Some(factory) = &self.energy_source else {
            return;
        };

        let events = self.events.clone();
        self.activity = Some(ActivityMonitor::start(
            &self.config.activity,
            factory(),
            move |speaking| {
                let _ = events.send(SessionEvent::Speaking(speaking));
            },
        ));
    }

    async fn terminate(&mut self, cause: ClientError) {
        error!("Session ended: {}", cause);
        self.leave_locally().await;
        self.signals.detach();
        self.inbound = None;
        self.emit(SessionEvent::Terminated(cause));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

async fn recv_frame(
    inbound: &mut Option<mpsc::UnboundedReceiver<ServerMessage>>,
) -> Option<ServerMessage> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

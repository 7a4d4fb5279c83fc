use crate::room::Room;
use crate::signaling::SignalingOutput;
use chorus_core::{MediaPatch, ParticipantId, ServerMessage};
use std::sync::Arc;
use tracing::debug;

/// Decides who hears about membership and media changes.
///
/// Each notification goes to the *other* members of a room only. Together with the
/// join response going to the joiner alone, every ordered pair learns about each
/// other exactly once.
#[derive(Clone)]
pub struct PresenceBroadcaster {
    output: Arc<dyn SignalingOutput>,
}

impl PresenceBroadcaster {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self { output }
    }

    /// Returns how many members were notified.
    pub async fn announce_join(&self, room: &Room, joiner: &ParticipantId) -> usize {
        let Some(info) = room.participant(joiner).map(|p| p.member_info()) else {
            return 0;
        };

        self.to_others(room, joiner, ServerMessage::UserJoined(info))
            .await
    }

    pub async fn announce_leave(&self, room: &Room, departed: &ParticipantId) -> usize {
        self.to_others(
            room,
            departed,
            ServerMessage::UserLeft {
                id: departed.clone(),
            },
        )
        .await
    }

    /// Empty patches are not broadcast.
    pub async fn announce_media(&self, room: &Room, id: &ParticipantId, changed: MediaPatch) -> usize {
        if changed.is_empty() {
            return 0;
        }

        self.to_others(
            room,
            id,
            ServerMessage::StatusUpdate {
                id: id.clone(),
                media: changed,
            },
        )
        .await
    }

    async fn to_others(&self, room: &Room, subject: &ParticipantId, message: ServerMessage) -> usize {
        let targets: Vec<_> = room.others(subject).map(|p| p.connection).collect();

        debug!(
            "Presence {:?} about {} -> {} members of {}",
            message,
            subject,
            targets.len(),
            room.code()
        );

        for connection in &targets {
            self.output.send(*connection, message.clone()).await;
        }

        targets.len()
    }
}

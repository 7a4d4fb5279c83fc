use crate::config::ServerConfig;
use crate::room::{Participant, Room};
use crate::signaling::ConnectionId;
use chorus_core::{
    DisplayName, MediaPatch, MediaState, MemberInfo, ParticipantId, ROOM_CODE_ALPHABET, RoomCode,
    RoomError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Source of fresh room codes and participant ids. Collisions are handled by the registry.
pub trait IdSource: Send + Sync {
    fn room_code(&mut self) -> RoomCode;

    fn participant_id(&mut self) -> ParticipantId;
}

pub struct RandomIds {
    rng: StdRng,
}

impl RandomIds {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for RandomIds {
    fn room_code(&mut self) -> RoomCode {
        RoomCode::from_indices(std::array::from_fn(|_| {
            self.rng.gen_range(0..ROOM_CODE_ALPHABET.len())
        }))
    }

    fn participant_id(&mut self) -> ParticipantId {
        ParticipantId::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub room_code: RoomCode,
    pub participant_id: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub room_code: RoomCode,
    pub participant_id: ParticipantId,
    /// Membership before the join, in join order.
    pub members: Vec<MemberInfo>,
}

#[derive(Debug, Clone)]
pub struct Departure {
    pub room_code: RoomCode,
    pub participant: Participant,
    pub room_closed: bool,
}

/// Owns every live room. Rooms exist only while they have participants.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    ids: Box<dyn IdSource>,
    capacity: usize,
    max_id_attempts: usize,
}

impl RoomRegistry {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_ids(config, Box::new(RandomIds::new()))
    }

    pub fn with_ids(config: &ServerConfig, ids: Box<dyn IdSource>) -> Self {
        Self {
            rooms: HashMap::new(),
            ids,
            capacity: config.max_room_size,
            max_id_attempts: config.max_id_attempts.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn create_room(
        &mut self,
        display_name: DisplayName,
        connection: ConnectionId,
    ) -> Result<Created, RoomError> {
        let code = (0..self.max_id_attempts)
            .map(|_| self.ids.room_code())
            .find(|code| !self.rooms.contains_key(code))
            .ok_or(RoomError::IdentifierExhausted)?;

        let mut room = Room::new(code.clone(), self.capacity);
        let participant_id =
            Self::fresh_participant_id(self.ids.as_mut(), &room, self.max_id_attempts)?;

        room.insert(Self::new_participant(participant_id.clone(), display_name, connection));
        self.rooms.insert(code.clone(), room);

        info!("Room {} created by {}", code, participant_id);

        Ok(Created {
            room_code: code,
            participant_id,
        })
    }

    /// Unknown and malformed codes are both reported as [`RoomError::NotFound`].
    pub fn join_room(
        &mut self,
        raw_code: &str,
        display_name: DisplayName,
        connection: ConnectionId,
    ) -> Result<Joined, RoomError> {
        let code = RoomCode::parse(raw_code).ok_or(RoomError::NotFound)?;
        let room = self.rooms.get_mut(&code).ok_or(RoomError::NotFound)?;

        if room.is_full() {
            return Err(RoomError::Full {
                capacity: self.capacity,
            });
        }

        let participant_id =
            Self::fresh_participant_id(self.ids.as_mut(), room, self.max_id_attempts)?;
        let members = room.members();

        room.insert(Self::new_participant(participant_id.clone(), display_name, connection));

        info!(
            "{} joined room {} ({} members)",
            participant_id,
            code,
            room.len()
        );

        Ok(Joined {
            room_code: code,
            participant_id,
            members,
        })
    }

    /// Idempotent: returns `None` when the participant (or its room) is already gone.
    pub fn leave_room(&mut self, code: &RoomCode, id: &ParticipantId) -> Option<Departure> {
        let room = self.rooms.get_mut(code)?;
        let participant = room.remove(id)?;
        let room_closed = room.is_empty();

        if room_closed {
            self.rooms.remove(code);
            info!("Room {} closed (empty)", code);
        } else {
            debug!("{} left room {}", id, code);
        }

        Some(Departure {
            room_code: code.clone(),
            participant,
            room_closed,
        })
    }

    /// Returns only the fields that changed; `None` if the participant is unknown.
    pub fn update_media(
        &mut self,
        code: &RoomCode,
        id: &ParticipantId,
        patch: MediaPatch,
    ) -> Option<MediaPatch> {
        let participant = self.rooms.get_mut(code)?.participant_mut(id)?;
        Some(participant.media.apply(patch))
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn participant(&self, code: &RoomCode, id: &ParticipantId) -> Option<&Participant> {
        self.rooms.get(code)?.participant(id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drops every room at once.
    pub fn clear(&mut self) -> usize {
        let count = self.rooms.len();
        self.rooms.clear();
        count
    }

    fn fresh_participant_id(
        ids: &mut dyn IdSource,
        room: &Room,
        attempts: usize,
    ) -> Result<ParticipantId, RoomError> {
        (0..attempts)
            .map(|_| ids.participant_id())
            .find(|id| !room.was_issued(id))
            .ok_or(RoomError::IdentifierExhausted)
    }

    fn new_participant(
        id: ParticipantId,
        display_name: DisplayName,
        connection: ConnectionId,
    ) -> Participant {
        Participant {
            id,
            display_name,
            media: MediaState::default(),
            joined_at: Instant::now(),
            connection,
        }
    }
}

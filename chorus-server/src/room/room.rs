use crate::signaling::ConnectionId;
use chorus_core::{DisplayName, MediaState, MemberInfo, ParticipantId, RoomCode};
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: DisplayName,
    pub media: MediaState,
    pub joined_at: Instant,
    pub connection: ConnectionId,
}

impl Participant {
    pub fn member_info(&self) -> MemberInfo {
        MemberInfo {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            media: self.media,
        }
    }
}

/// A live room. Participants are kept in join order.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    participants: Vec<Participant>,
    /// Every id ever handed out in this room, so none is issued twice while it lives.
    issued_ids: HashSet<ParticipantId>,
    capacity: usize,
    created_at: Instant,
}

impl Room {
    pub(crate) fn new(code: RoomCode, capacity: usize) -> Self {
        Self {
            code,
            participants: Vec::new(),
            issued_ids: HashSet::new(),
            capacity,
            created_at: Instant::now(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub(crate) fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }

    /// Everyone in the room except `id`.
    pub fn others<'a>(&'a self, id: &'a ParticipantId) -> impl Iterator<Item = &'a Participant> {
        self.participants.iter().filter(move |p| &p.id != id)
    }

    pub fn members(&self) -> Vec<MemberInfo> {
        self.participants.iter().map(Participant::member_info).collect()
    }

    pub(crate) fn was_issued(&self, id: &ParticipantId) -> bool {
        self.issued_ids.contains(id)
    }

    pub(crate) fn insert(&mut self, participant: Participant) {
        self.issued_ids.insert(participant.id.clone());
        self.participants.push(participant);
    }

    pub(crate) fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| &p.id == id)?;
        Some(self.participants.remove(index))
    }
}

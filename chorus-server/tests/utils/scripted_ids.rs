use chorus_core::{ParticipantId, RoomCode};
use chorus_server::IdSource;
use std::collections::VecDeque;

/// Deterministic ids: room codes from a script, participants `u1`, `u2`, ...
pub struct ScriptedIds {
    codes: VecDeque<String>,
    next_participant: usize,
}

impl ScriptedIds {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_string()).collect(),
            next_participant: 0,
        }
    }
}

impl IdSource for ScriptedIds {
    fn room_code(&mut self) -> RoomCode {
        let code = self.codes.pop_front().unwrap_or_else(|| "ZZZZZZ".into());
        RoomCode::parse(&code).expect("scripted room code must be valid")
    }

    fn participant_id(&mut self) -> ParticipantId {
        self.next_participant += 1;
        ParticipantId::from(format!("u{}", self.next_participant))
    }
}

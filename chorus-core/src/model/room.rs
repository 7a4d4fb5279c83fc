use serde::{Deserialize, Serialize};
use std::fmt;

pub const ROOM_CODE_LEN: usize = 6;

pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_ROOM_CAPACITY: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes user input (surrounding whitespace, lowercase) and validates it.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_ascii_uppercase();

        let valid = code.len() == ROOM_CODE_LEN
            && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));

        valid.then_some(Self(code))
    }

    /// Builds a code from alphabet positions; each index wraps around the alphabet.
    pub fn from_indices(indices: [usize; ROOM_CODE_LEN]) -> Self {
        let code = indices
            .iter()
            .map(|&i| ROOM_CODE_ALPHABET[i % ROOM_CODE_ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const MAX_DISPLAY_NAME_CHARS: usize = 20;

pub const DEFAULT_DISPLAY_NAME: &str = "Guest";

/// Connection-scoped participant identity. A fresh id is issued on every join,
/// so ordering between ids is only meaningful inside one room session.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lexicographically lower id of a pair always makes the offer.
    pub fn offers_to(&self, remote: &ParticipantId) -> bool {
        self < remote
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// Strips control and markup characters, trims, and caps the name at
    /// [`MAX_DISPLAY_NAME_CHARS`]. Empty input falls back to [`DEFAULT_DISPLAY_NAME`].
    pub fn sanitize(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | '&' | '"' | '\''))
            .collect();

        let capped: String = cleaned.trim().chars().take(MAX_DISPLAY_NAME_CHARS).collect();
        let capped = capped.trim_end();

        if capped.is_empty() {
            Self(DEFAULT_DISPLAY_NAME.to_owned())
        } else {
            Self(capped.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

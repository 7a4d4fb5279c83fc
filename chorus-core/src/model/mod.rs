mod media;
mod participant;
mod protocol;
mod room;
mod signaling;

pub use media::{MediaPatch, MediaState};
pub use participant::{DEFAULT_DISPLAY_NAME, DisplayName, MAX_DISPLAY_NAME_CHARS, ParticipantId};
pub use protocol::{ClientMessage, MemberInfo, ServerMessage};
pub use room::{DEFAULT_ROOM_CAPACITY, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
pub use signaling::{IceCandidate, SessionDescription, Signal, SignalMessage};

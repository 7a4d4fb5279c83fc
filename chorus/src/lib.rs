pub use chorus_core::{ParticipantId, RoomCode};

pub mod model {
    pub use chorus_core::model::*;
    pub use chorus_core::{RoomError, SignalingError};
}

#[cfg(feature = "server")]
pub mod server {
    pub use chorus_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use chorus_client::*;
}

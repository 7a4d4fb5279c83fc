pub mod error;
pub mod model;

pub use error::{RoomError, SignalingError};
pub use model::*;

mod connector;
mod link;
mod orchestrator;
mod signal_sender;
mod webrtc_connector;

pub use connector::*;
pub use link::*;
pub use orchestrator::*;
pub use signal_sender::*;
pub use webrtc_connector::*;

pub mod mock_signaling;
pub mod scripted_ids;
pub mod test_server;

pub use mock_signaling::*;
pub use scripted_ids::*;
pub use test_server::*;

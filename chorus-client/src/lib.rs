mod activity;
mod config;
mod error;
mod media;
mod peer;
mod reconnect;
mod session;
mod transport;

pub use activity::*;
pub use config::*;
pub use error::*;
pub use media::*;
pub use peer::*;
pub use reconnect::*;
pub use session::*;
pub use transport::*;

#[cfg(test)]
pub(crate) mod test_support;

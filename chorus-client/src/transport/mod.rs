mod ws;

pub use ws::*;

use crate::error::ClientError;
use async_trait::async_trait;
use chorus_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;

/// One live signaling socket. The socket is gone once `inbound` yields `None`;
/// dropping `outbound` closes it from this side.
pub struct SignalingChannel {
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn connect(&self) -> Result<SignalingChannel, ClientError>;
}

use crate::error::ClientError;
use chorus_core::ClientMessage;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Outgoing side of the signaling socket as seen by the negotiation logic.
pub trait SignalSender: Send + Sync {
    fn send(&self, message: ClientMessage) -> Result<(), ClientError>;
}

/// A `SignalSender` whose underlying socket can be swapped on reconnect.
/// While detached, every send fails with `ClientError::Connection`.
#[derive(Default)]
pub struct OutboundSignals {
    tx: Mutex<Option<mpsc::UnboundedSender<ClientMessage>>>,
}

impl OutboundSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, tx: mpsc::UnboundedSender<ClientMessage>) {
        if let Ok(mut slot) = self.tx.lock() {
            *slot = Some(tx);
        }
    }

    pub fn detach(&self) {
        if let Ok(mut slot) = self.tx.lock() {
            slot.take();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.tx
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }
}

impl SignalSender for OutboundSignals {
    fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        let slot = self
            .tx
            .lock()
            .map_err(|_| ClientError::Connection("outbound queue poisoned".into()))?;

        let tx = slot
            .as_ref()
            .ok_or_else(|| ClientError::Connection("not connected".into()))?;

        tx.send(message)
            .map_err(|_| ClientError::Connection("socket closed".into()))
    }
}

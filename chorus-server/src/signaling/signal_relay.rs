use crate::room::{Membership, RoomRegistry};
use crate::signaling::SignalingOutput;
use chorus_core::{Signal, SignalingError};
use std::sync::Arc;
use tracing::debug;

/// Forwards negotiation payloads to their target's socket. Nothing is queued:
/// a signal for a participant who is not in the sender's room is dropped.
#[derive(Clone)]
pub struct SignalRelay {
    output: Arc<dyn SignalingOutput>,
}

impl SignalRelay {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self { output }
    }

    pub async fn relay(
        &self,
        registry: &RoomRegistry,
        sender: &Membership,
        signal: Signal,
    ) -> Result<(), SignalingError> {
        if signal.room_code() != &sender.room_code {
            return Err(SignalingError::RoomMismatch {
                expected: sender.room_code.clone(),
                got: signal.room_code().clone(),
            });
        }

        let target = registry
            .participant(&sender.room_code, signal.target_id())
            .ok_or_else(|| SignalingError::PeerNotFound(signal.target_id().clone()))?;

        debug!(
            "Relaying {} {} -> {} in {}",
            signal.kind(),
            sender.participant_id,
            target.id,
            sender.room_code
        );

        let connection = target.connection;
        let signal = signal.stamped_from(sender.participant_id.clone());
        self.output.send(connection, signal.into()).await;

        Ok(())
    }
}

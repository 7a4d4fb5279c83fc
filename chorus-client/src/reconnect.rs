use crate::error::ClientError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Schedules bounded reconnection attempts after the signaling socket drops.
///
/// At most one attempt is pending at a time. Every timer carries a generation
/// number; a tick whose generation is not the latest one is ignored, so a timer
/// that was replaced can never cause a second attempt.
pub struct ReconnectionSupervisor {
    delay: Duration,
    max_attempts: u32,
    attempts: u32,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    fire_tx: mpsc::UnboundedSender<u64>,
}

impl ReconnectionSupervisor {
    /// Returns the supervisor and the receiver its timers fire into.
    pub fn new(delay: Duration, max_attempts: u32) -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            delay,
            max_attempts,
            attempts: 0,
            generation: 0,
            pending: None,
            fire_tx,
        };
        (supervisor, fire_rx)
    }

    /// Arms one attempt after the configured delay, replacing any pending one.
    pub fn schedule(&mut self) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let delay = self.delay;
        let fire_tx = self.fire_tx.clone();
        info!("Reconnecting in {:?}", delay);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fire_tx.send(generation);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accepts a fired tick. Returns the attempt number, or `None` for a tick
    /// belonging to a timer that has since been replaced or cancelled.
    pub fn fire(&mut self, generation: u64) -> Option<u32> {
        if generation != self.generation || self.pending.is_none() {
            return None;
        }
        self.pending = None;
        self.attempts += 1;
        Some(self.attempts)
    }

    /// Records a failed attempt: re-arms, or gives up once the budget is spent.
    pub fn attempt_failed(&mut self) -> Result<(), ClientError> {
        if self.attempts >= self.max_attempts {
            warn!("Giving up after {} reconnect attempts", self.attempts);
            return Err(ClientError::TransportLost {
                attempts: self.attempts,
            });
        }
        self.schedule();
        Ok(())
    }

    pub fn recovered(&mut self) {
        self.cancel();
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Drop for ReconnectionSupervisor {
    fn drop(&mut self) {
        self.cancel();
    }
}

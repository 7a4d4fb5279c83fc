use crate::error::ClientError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// The local microphone, as far as the session is concerned.
#[async_trait]
pub trait LocalMedia: Send + Sync {
    /// Opens the capture device. Fails with `ClientError::MediaAccessDenied`.
    async fn acquire(&self) -> Result<(), ClientError>;

    fn set_mic(&self, enabled: bool);

    /// Stops capture. Safe to call when nothing was acquired.
    async fn release(&self);
}

/// Receive-only participation: nothing is captured, mute state is only tracked.
#[derive(Debug, Default)]
pub struct NoLocalMedia {
    mic: AtomicBool,
}

impl NoLocalMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mic_enabled(&self) -> bool {
        self.mic.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LocalMedia for NoLocalMedia {
    async fn acquire(&self) -> Result<(), ClientError> {
        self.mic.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn set_mic(&self, enabled: bool) {
        debug!("mic {}", if enabled { "on" } else { "muted" });
        self.mic.store(enabled, Ordering::Relaxed);
    }

    async fn release(&self) {
        self.mic.store(false, Ordering::Relaxed);
    }
}

use crate::config::ActivityConfig;
use tokio::task::JoinHandle;
use tracing::debug;

/// Frequency-domain view of the local audio signal.
pub trait EnergySource: Send + 'static {
    /// Fills `bins` with the latest magnitudes. Returns `false` once the source is gone.
    fn fill(&mut self, bins: &mut [u8]) -> bool;
}

impl EnergySource for Box<dyn EnergySource> {
    fn fill(&mut self, bins: &mut [u8]) -> bool {
        (**self).fill(bins)
    }
}

pub fn mean_energy(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().map(|&b| b as f32).sum::<f32>() / bins.len() as f32
}

/// Samples an `EnergySource` on a self-rearming timer and reports changes of the
/// speaking flag. The sampling task stops when the monitor is dropped.
pub struct ActivityMonitor {
    task: JoinHandle<()>,
}

impl ActivityMonitor {
    pub fn start<S, F>(config: &ActivityConfig, mut source: S, mut on_change: F) -> Self
    where
        S: EnergySource,
        F: FnMut(bool) + Send + 'static,
    {
        let interval = config.interval();
        let threshold = config.threshold;
        let mut bins = vec![0u8; config.bins];

        let task = tokio::spawn(async move {
            let mut speaking = false;
            loop {
                tokio::time::sleep(interval).await;
                if !source.fill(&mut bins) {
                    debug!("Energy source ended");
                    break;
                }

                let now = mean_energy(&bins) > threshold;
                if now != speaking {
                    speaking = now;
                    on_change(now);
                }
            }

            if speaking {
                on_change(false);
            }
        });

        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

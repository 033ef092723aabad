use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use crate::metrics::SWEPT_ENTRIES;
use crate::rate_limit::RateLimiter;

// Handle to the background sweep task
pub struct Sweeper {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Signal the task and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Sweeper task ended abnormally");
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// Periodically drop entries whose window and block have both expired
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) -> Sweeper {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut interval = interval(every);
        tracing::info!(interval = ?every, "Sweeper started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = limiter.sweep();
                    if removed > 0 {
                        SWEPT_ENTRIES.inc_by(removed as f64);
                        tracing::debug!(removed, remaining = limiter.len(), "Swept expired entries");
                    }
                }
                // sender dropped counts as stop too
                res = stop_rx.changed() => {
                    if res.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Sweeper stopped");
    });

    Sweeper { stop_tx, handle }
}

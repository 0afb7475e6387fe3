//! Expiration Sweeper
//!
//! Background task that periodically evicts expired records from a
//! backend without native TTL. Cancellation is checked every tick, and
//! stopping is one-way: a stopped sweeper never restarts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::Backend;

/// Handle to a running sweeper. Owned by the store; dropped only after
/// [`stop`](SweeperHandle::stop) has cancelled and joined the task, so the
/// periodic timer is never leaked.
pub(crate) struct SweeperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawn a sweeper over `backend`, ticking every `sweep_interval`.
    pub(crate) fn spawn(
        backend: Arc<Mutex<Box<dyn Backend>>>,
        sweep_interval: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        let task = tokio::spawn(run(backend, sweep_interval, token.clone()));
        Self { token, task }
    }

    /// Cancel the sweeper and wait for it to finish. Consuming `self`
    /// makes the Running to Stopped transition one-way.
    pub(crate) async fn stop(self) {
        self.token.cancel();
        if self.task.await.is_err() {
            warn!("sweeper task panicked before shutdown");
        }
    }
}

async fn run(
    backend: Arc<Mutex<Box<dyn Backend>>>,
    sweep_interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = interval(sweep_interval);
    info!(interval = ?sweep_interval, "expiration sweeper started");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("expiration sweeper stopped");
                return;
            }
            _ = ticker.tick() => {
                match backend.lock().await.clear_expired().await {
                    Ok(removed) if removed > 0 => {
                        debug!(removed, "sweep evicted expired session records");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "sweep failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use bytes::Bytes;

    fn backend(ttl: Duration) -> Arc<Mutex<Box<dyn Backend>>> {
        Arc::new(Mutex::new(
            Box::new(InMemoryBackend::new(32, ttl)) as Box<dyn Backend>
        ))
    }

    #[tokio::test]
    async fn test_sweeper_evicts_expired_records() {
        let ttl = Duration::from_millis(20);
        let backend = backend(ttl);

        for _ in 0..5 {
            backend
                .lock()
                .await
                .set(Bytes::from_static(b"payload"))
                .await
                .unwrap();
        }

        let handle = SweeperHandle::spawn(backend.clone(), ttl);

        // Wait past the TTL plus one sweep interval.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await;

        // Everything expired, so a manual sweep has nothing left to do.
        let remaining = backend.lock().await.clear_expired().await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_stop_is_prompt() {
        let backend = backend(Duration::from_secs(3600));
        let handle = SweeperHandle::spawn(backend, Duration::from_secs(3600));

        // Stopping must not wait for the next tick.
        tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .expect("sweeper did not stop promptly");
    }
}

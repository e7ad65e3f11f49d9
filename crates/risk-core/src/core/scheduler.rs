//! Periodic refresh loops with deterministic shutdown.
//!
//! Each loop runs its task once immediately, then on every interval tick,
//! until the shared `CancellationToken` is cancelled. A failing task is
//! logged and retried on the next tick. Cancellation also interrupts a task
//! that is still running.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct RefreshScheduler {
    shutdown: CancellationToken,
    loops: Vec<(String, JoinHandle<()>)>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Loops stop when `shutdown` (or any parent of it) is cancelled.
    pub fn with_token(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            loops: Vec::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn spawn<F, Fut>(&mut self, name: impl Into<String>, interval: Duration, mut task: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let shutdown = self.shutdown.clone();
        let loop_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(task = %loop_name, interval_secs = interval.as_secs(), "refresh loop started");

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    () = shutdown.cancelled() => break,
                    result = task() => {
                        if let Err(e) = result {
                            warn!(task = %loop_name, error = %e, "refresh failed");
                        } else {
                            debug!(task = %loop_name, "refresh complete");
                        }
                    }
                }
            }

            info!(task = %loop_name, "refresh loop stopped");
        });

        self.loops.push((name, handle));
    }

    /// Cancel every loop and wait for each to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for (name, handle) in self.loops {
            if let Err(e) = handle.await {
                warn!(task = %name, error = %e, "refresh loop panicked");
            }
        }
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_task(
        runs: &Arc<AtomicUsize>,
    ) -> impl FnMut() -> futures::future::Ready<anyhow::Result<()>> + Send + 'static {
        let runs = Arc::clone(runs);
        move || {
            runs.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();
        scheduler.spawn("overview", Duration::from_secs(10), counter_task(&runs));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_runs_after_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();
        scheduler.spawn("alerts", Duration::from_secs(5), counter_task(&runs));
        assert_eq!(scheduler.len(), 1);

        tokio::time::sleep(Duration::from_millis(1)).await;
        scheduler.shutdown().await;
        let after_shutdown = runs.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_loop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();
        let counter = Arc::clone(&runs);
        scheduler.spawn("positions", Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Err(anyhow::anyhow!("upstream unavailable")))
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_running_task() {
        let mut scheduler = RefreshScheduler::new();
        scheduler.spawn("slow", Duration::from_secs(1), || async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<(), anyhow::Error>(())
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        let token = scheduler.token();
        scheduler.shutdown().await;
        assert!(token.is_cancelled());
    }
}

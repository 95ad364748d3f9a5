use crate::coordinator::QuoteSyncCoordinator;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct Running {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodically refreshes quotes until stopped.
///
/// Stopping interrupts the wait between refreshes. A refresh that is already
/// running is allowed to finish.
pub struct RefreshScheduler {
    coordinator: Arc<QuoteSyncCoordinator>,
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl RefreshScheduler {
    pub fn new(coordinator: Arc<QuoteSyncCoordinator>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
            running: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Starts the refresh loop. Does nothing if it is already running.
    pub fn start(&self) {
        let mut running = self.lock();
        if running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
        {
            debug!("Refresh scheduler already running");
            return;
        }

        let (cancel, mut cancelled) = watch::channel(false);
        let coordinator = Arc::clone(&self.coordinator);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            info!(?interval, "Refresh scheduler started");
            loop {
                if *cancelled.borrow() {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = cancelled.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                // The cancel value stays borrowed until the refresh is marked
                // in progress, so `stop()` cannot return in between.
                let loading = {
                    let stopped = cancelled.borrow();
                    if *stopped {
                        break;
                    }
                    coordinator.begin_refresh()
                };
                if let Some(loading) = loading {
                    coordinator.complete_refresh(loading).await;
                }
            }
            info!("Refresh scheduler stopped");
        });

        *running = Some(Running { cancel, handle });
    }

    /// Signals the loop to stop and releases it. Once this returns no new
    /// refresh is started by the loop.
    pub fn stop(&self) {
        if let Some(running) = self.lock().take() {
            debug!("Stopping refresh scheduler");
            // The loop may already have exited and dropped its receiver.
            let _ = running.cancel.send(true);
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

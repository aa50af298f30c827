//! Periodic reconciliation with the server-side mining flag
//!
//! One loop per controller, running only while mining. Each tick optionally
//! sends a heartbeat and then runs the controller's state sync; outcomes are
//! broadcast as [`SyncEvent`]s so UI layers subscribe instead of running
//! timers of their own. There is no backoff: a failing endpoint is simply
//! retried on the next tick.

use crate::errors::MiningResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Target of the reconciliation loop.
#[async_trait]
pub trait StateSync: Send + Sync + 'static {
    async fn heartbeat(&self) -> MiningResult<bool>;

    /// Compare local belief with the server and publish the outcome.
    async fn sync(&self) -> MiningResult<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    InSync { is_mining: bool },
    /// The server disagrees with local belief. Corrected on the next full
    /// stats refresh, not by the sync itself.
    ChangedExternally { local: bool, remote: bool },
    Failed { error: String },
}

pub struct ReconciliationLoop {
    interval: Duration,
    send_heartbeat: bool,
    events: broadcast::Sender<SyncEvent>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReconciliationLoop {
    pub fn new(interval: Duration, send_heartbeat: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            interval,
            send_heartbeat,
            events,
            handle: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Start ticking against `target`. The loop holds only a weak reference
    /// and exits once the target is dropped. Starting a running loop is a no-op.
    pub fn start<S: StateSync>(&self, target: Weak<S>) {
        let mut handle = self.handle.lock();
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let period = self.interval;
        let heartbeat = self.send_heartbeat;
        info!(
            interval_secs = period.as_secs_f64(),
            heartbeat, "Starting reconciliation loop"
        );

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(target) = target.upgrade() else {
                    debug!("Reconciliation target dropped, loop exiting");
                    break;
                };

                if heartbeat {
                    if let Err(e) = target.heartbeat().await {
                        warn!(error = %e, "Heartbeat failed");
                    }
                }
                // sync() logs and publishes its own outcome
                let _ = target.sync().await;
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            debug!("Reconciliation loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ReconciliationLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

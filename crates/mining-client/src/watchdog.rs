//! One-shot recovery for sessions the server flags as unhealthy

use crate::controller::MiningSessionController;
use crate::errors::MiningResult;
use crate::types::{MiningStats, Notice};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Watches stats snapshots for `is_mining && !is_mining_healthy` and, the
/// first time it sees that, runs a single state sync. Later unhealthy reports
/// are ignored for the lifetime of the watchdog.
pub struct MiningHealthWatchdog {
    controller: MiningSessionController,
    sync_attempted: AtomicBool,
}

impl MiningHealthWatchdog {
    pub fn new(controller: MiningSessionController) -> Self {
        Self {
            controller,
            sync_attempted: AtomicBool::new(false),
        }
    }

    /// Returns `None` when nothing was attempted, otherwise the sync result.
    pub async fn observe(&self, stats: &MiningStats) -> Option<MiningResult<bool>> {
        if !stats.is_mining || stats.is_mining_healthy {
            return None;
        }
        if self.sync_attempted.swap(true, Ordering::SeqCst) {
            return None;
        }

        warn!("Mining session reported unhealthy, attempting sync");
        let result = self.controller.sync().await;
        match &result {
            Ok(true) => {
                info!("Mining session restored");
                self.controller
                    .notify(Notice::success("Mining session restored"));
            }
            Ok(false) => warn!("Mining session not active after sync"),
            Err(e) => warn!(error = %e, "Mining health sync failed"),
        }
        Some(result)
    }

    pub fn has_attempted(&self) -> bool {
        self.sync_attempted.load(Ordering::SeqCst)
    }
}

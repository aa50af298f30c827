//! Mining client configuration

use crate::combo::{DEFAULT_COMBO_CAP, DEFAULT_COMBO_STEP};
use crate::queue::{DrainPolicy, DEFAULT_BATCH_THRESHOLD, DEFAULT_FLUSH_AFTER};
use crate::types::ActivityType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How a multi-entry batch is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSubmission {
    /// One `record_activity` call with summed points and tokens, attributed to
    /// the first entry's type. This is what the backend has historically
    /// received; per-type analytics for mixed batches are lost.
    #[default]
    Aggregate,
    /// One `batch_record_activities` call carrying every entry.
    Itemized,
}

/// Per-type daily interaction caps. Activities without a field are uncapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyLimits {
    pub posts: u32,
    pub comments: u32,
    pub likes: u32,
    pub shares: u32,
    pub invites: u32,
}

impl Default for DailyLimits {
    fn default() -> Self {
        Self {
            posts: 10,
            comments: 50,
            likes: 100,
            shares: 20,
            invites: 10,
        }
    }
}

impl DailyLimits {
    pub fn limit_for(&self, activity: ActivityType) -> Option<u32> {
        match activity {
            ActivityType::Post => Some(self.posts),
            ActivityType::Comment => Some(self.comments),
            ActivityType::Like => Some(self.likes),
            ActivityType::Share => Some(self.shares),
            ActivityType::Invite => Some(self.invites),
            ActivityType::Login => None,
        }
    }

    /// Load a limits table from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Timing and policy knobs for the session controller.
#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Minimum interval between accepted toggles.
    pub toggle_throttle: Duration,
    /// Age after which an in-flight marker is abandoned.
    pub guard_timeout: Duration,
    /// Upper bound on any single backend call.
    pub request_timeout: Duration,
    pub batch_threshold: usize,
    pub flush_after: Duration,
    /// Delay before re-syncing after a successful flush.
    pub post_flush_sync_delay: Duration,
    pub reconcile_interval: Duration,
    pub efficiency_interval: Duration,
    /// Resolution of the elapsed-time view.
    pub tick_interval: Duration,
    pub combo_step: f64,
    pub combo_cap: f64,
    pub batch_submission: BatchSubmission,
    /// Send a heartbeat on every reconciliation tick.
    pub send_heartbeat: bool,
    pub daily_limits: DailyLimits,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            toggle_throttle: Duration::from_millis(1000),
            guard_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            flush_after: DEFAULT_FLUSH_AFTER,
            post_flush_sync_delay: Duration::from_millis(500),
            reconcile_interval: Duration::from_secs(30),
            efficiency_interval: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
            combo_step: DEFAULT_COMBO_STEP,
            combo_cap: DEFAULT_COMBO_CAP,
            batch_submission: BatchSubmission::default(),
            send_heartbeat: true,
            daily_limits: DailyLimits::default(),
        }
    }
}

impl MiningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toggle_throttle(mut self, throttle: Duration) -> Self {
        self.toggle_throttle = throttle;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_guard_timeout(mut self, timeout: Duration) -> Self {
        self.guard_timeout = timeout;
        self
    }

    /// Values below one are treated as one.
    pub fn with_batch_threshold(mut self, threshold: usize) -> Self {
        self.batch_threshold = threshold.max(1);
        self
    }

    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    pub fn with_batch_submission(mut self, mode: BatchSubmission) -> Self {
        self.batch_submission = mode;
        self
    }

    pub fn with_heartbeat(mut self, enabled: bool) -> Self {
        self.send_heartbeat = enabled;
        self
    }

    pub fn with_daily_limits(mut self, limits: DailyLimits) -> Self {
        self.daily_limits = limits;
        self
    }

    pub fn drain_policy(&self) -> DrainPolicy {
        DrainPolicy {
            batch_threshold: self.batch_threshold.max(1),
            flush_after: self.flush_after,
        }
    }
}

//! In-memory backend double shared by the controller, reconciliation and
//! watchdog tests.

use crate::backend::MiningBackend;
use crate::types::{
    ActivitySubmission, BatchRecordResult, DailyCounters, MiningStats, RecordOutcome,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    inner: Arc<RecordingBackendInner>,
}

#[derive(Default)]
struct RecordingBackendInner {
    operations: Mutex<Vec<String>>,
    recorded: Mutex<Vec<ActivitySubmission>>,
    batches: Mutex<Vec<Vec<ActivitySubmission>>>,
    stats: Mutex<MiningStats>,
    latency: Mutex<Duration>,
    refuse_toggle: AtomicBool,
    fail_record: AtomicBool,
    fail_status: AtomicBool,
    server_mining: AtomicBool,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn record(&self, entry: impl Into<String>) {
        self.inner.operations.lock().push(entry.into());
    }

    async fn simulate_latency(&self) {
        let latency = *self.inner.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    pub(crate) fn operations(&self) -> Vec<String> {
        self.inner.operations.lock().clone()
    }

    pub(crate) fn count(&self, operation: &str) -> usize {
        self.inner
            .operations
            .lock()
            .iter()
            .filter(|op| op.as_str() == operation)
            .count()
    }

    pub(crate) fn recorded(&self) -> Vec<ActivitySubmission> {
        self.inner.recorded.lock().clone()
    }

    pub(crate) fn batches(&self) -> Vec<Vec<ActivitySubmission>> {
        self.inner.batches.lock().clone()
    }

    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock() = latency;
    }

    pub(crate) fn set_refuse_toggle(&self, refuse: bool) {
        self.inner.refuse_toggle.store(refuse, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_record(&self, fail: bool) {
        self.inner.fail_record.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_status(&self, fail: bool) {
        self.inner.fail_status.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_server_mining(&self, mining: bool) {
        self.inner.server_mining.store(mining, Ordering::SeqCst);
    }

    pub(crate) fn set_stats(&self, stats: MiningStats) {
        self.inner
            .server_mining
            .store(stats.is_mining, Ordering::SeqCst);
        *self.inner.stats.lock() = stats;
    }

    pub(crate) fn set_daily(&self, daily: DailyCounters) {
        self.inner.stats.lock().daily = daily;
    }
}

#[async_trait]
impl MiningBackend for RecordingBackend {
    async fn start_mining(&self, _user_id: &str) -> anyhow::Result<bool> {
        self.record("start");
        self.simulate_latency().await;
        let accepted = !self.inner.refuse_toggle.load(Ordering::SeqCst);
        if accepted {
            self.set_server_mining(true);
        }
        Ok(accepted)
    }

    async fn stop_mining(&self, _user_id: &str) -> anyhow::Result<bool> {
        self.record("stop");
        self.simulate_latency().await;
        let accepted = !self.inner.refuse_toggle.load(Ordering::SeqCst);
        if accepted {
            self.set_server_mining(false);
        }
        Ok(accepted)
    }

    async fn record_activity(
        &self,
        _user_id: &str,
        activity: &ActivitySubmission,
    ) -> anyhow::Result<RecordOutcome> {
        self.record("record");
        self.simulate_latency().await;
        if self.inner.fail_record.load(Ordering::SeqCst) {
            anyhow::bail!("activity endpoint unavailable");
        }
        self.inner.recorded.lock().push(activity.clone());
        Ok(RecordOutcome::Accepted(None))
    }

    async fn batch_record_activities(
        &self,
        _user_id: &str,
        activities: &[ActivitySubmission],
    ) -> anyhow::Result<BatchRecordResult> {
        self.record("batch");
        self.simulate_latency().await;
        if self.inner.fail_record.load(Ordering::SeqCst) {
            return Ok(BatchRecordResult::default());
        }
        self.inner.batches.lock().push(activities.to_vec());
        Ok(BatchRecordResult {
            success: true,
            count: activities.len(),
        })
    }

    async fn get_mining_stats(&self, _user_id: &str) -> anyhow::Result<MiningStats> {
        self.record("stats");
        let mut stats = self.inner.stats.lock().clone();
        stats.is_mining = self.inner.server_mining.load(Ordering::SeqCst);
        Ok(stats)
    }

    async fn check_mining_status(&self, _user_id: &str) -> anyhow::Result<bool> {
        self.record("status");
        if self.inner.fail_status.load(Ordering::SeqCst) {
            anyhow::bail!("status endpoint unavailable");
        }
        Ok(self.inner.server_mining.load(Ordering::SeqCst))
    }

    async fn send_heartbeat(&self, _user_id: &str) -> anyhow::Result<bool> {
        self.record("heartbeat");
        Ok(true)
    }
}

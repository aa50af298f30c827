//! Mining backend abstraction
//!
//! The server owns mining state; the client only talks to it through this
//! trait. The production implementation is [`crate::HttpMiningBackend`];
//! tests inject recording doubles. None of the calls carry idempotency keys,
//! so the controller never retries them.

use crate::types::{ActivitySubmission, BatchRecordResult, MiningStats, RecordOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait MiningBackend: Send + Sync {
    /// Open a mining session. `false` means the server refused.
    async fn start_mining(&self, user_id: &str) -> anyhow::Result<bool>;

    /// Close the current mining session.
    async fn stop_mining(&self, user_id: &str) -> anyhow::Result<bool>;

    /// Record one activity (or one aggregated batch).
    async fn record_activity(
        &self,
        user_id: &str,
        activity: &ActivitySubmission,
    ) -> anyhow::Result<RecordOutcome>;

    /// Record several activities in one call.
    async fn batch_record_activities(
        &self,
        user_id: &str,
        activities: &[ActivitySubmission],
    ) -> anyhow::Result<BatchRecordResult>;

    /// Fetch the full stats snapshot.
    async fn get_mining_stats(&self, user_id: &str) -> anyhow::Result<MiningStats>;

    /// Server-side "is mining" flag.
    async fn check_mining_status(&self, user_id: &str) -> anyhow::Result<bool>;

    /// Keep the server-side session marked alive.
    async fn send_heartbeat(&self, user_id: &str) -> anyhow::Result<bool>;
}

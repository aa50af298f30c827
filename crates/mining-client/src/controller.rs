//! Mining session controller
//!
//! The single in-process owner of "am I mining" and the surface UI layers
//! call. It coordinates the activity queue, the optimistic ledger, the combo
//! multiplier, the efficiency model and the reconciliation loop.
//!
//! ## States
//! - **Idle**: no session; interactions are refused
//! - **Mining**: session open; interactions are queued and flushed in batches
//!
//! Only a successful `toggle_mining` moves between the two (a full stats
//! refresh may also adopt the server's view). A failed toggle leaves the
//! state untouched.
//!
//! Shared state lives behind a `parking_lot::Mutex` that is never held across
//! an await; backend calls run with a request timeout and their results are
//! discarded once the controller has been shut down.

use crate::backend::MiningBackend;
use crate::combo::ComboMultiplier;
use crate::config::MiningConfig;
use crate::efficiency::{efficiency, minutes_since};
use crate::errors::{MiningError, MiningResult};
use crate::guard::{FlightToken, InFlightGuard, Throttle};
use crate::ledger::{DeltaId, OptimisticLedger};
use crate::queue::{ActivityQueue, Batch, DrainDecision, Submission};
use crate::reconcile::{ReconciliationLoop, StateSync, SyncEvent};
use crate::types::{ActivityEntry, ActivityType, MiningStats, Notice, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant};
use tracing::{debug, error, info, warn};

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MiningTransition {
    Started,
    Stopped,
}

/// Read-only view published to subscribers on every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub is_mining: bool,
    pub elapsed_seconds: u64,
    pub total_earnings: f64,
    pub combo_multiplier: f64,
    pub efficiency: f64,
    pub queued_activities: usize,
    /// Interaction types currently being processed
    pub pending: Vec<ActivityType>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

struct SessionState {
    user_id: Option<UserId>,
    is_mining: bool,
    started_at: Option<Instant>,
    elapsed_seconds: u64,
    last_activity_at: Option<DateTime<Utc>>,
    /// Monotonic twin of `last_activity_at`; drives the recency bonus
    last_activity: Option<Instant>,
    stats: Option<MiningStats>,
    /// Interactions accepted since the last stats refresh
    local_counts: HashMap<ActivityType, u32>,
    pending: BTreeSet<ActivityType>,
    queue: ActivityQueue,
    ledger: OptimisticLedger,
    combo: ComboMultiplier,
    efficiency: f64,
    toggle_throttle: Throttle,
    toggle_guard: InFlightGuard,
    drain_guard: InFlightGuard,
}

impl SessionState {
    fn new(config: &MiningConfig) -> Self {
        Self {
            user_id: None,
            is_mining: false,
            started_at: None,
            elapsed_seconds: 0,
            last_activity_at: None,
            last_activity: None,
            stats: None,
            local_counts: HashMap::new(),
            pending: BTreeSet::new(),
            queue: ActivityQueue::new(),
            ledger: OptimisticLedger::new(),
            combo: ComboMultiplier::new(config.combo_step, config.combo_cap),
            efficiency: 1.0,
            toggle_throttle: Throttle::new(config.toggle_throttle),
            toggle_guard: InFlightGuard::new("toggle", config.guard_timeout),
            drain_guard: InFlightGuard::new("drain", config.guard_timeout),
        }
    }

    fn begin_session(&mut self) {
        self.is_mining = true;
        self.started_at = Some(Instant::now());
        self.elapsed_seconds = 0;
    }

    fn end_session(&mut self) {
        self.is_mining = false;
        self.started_at = None;
        self.elapsed_seconds = 0;
    }

    fn mark_activity(&mut self) {
        self.last_activity_at = Some(Utc::now());
        self.last_activity = Some(Instant::now());
    }

    /// Take the server's last-activity time if it is newer than ours.
    fn adopt_server_activity(&mut self, server_last: DateTime<Utc>) {
        if self.last_activity_at.is_some_and(|local| local >= server_last) {
            return;
        }
        self.last_activity_at = Some(server_last);
        let age_minutes = minutes_since(Some(server_last), Utc::now())
            .unwrap_or(0.0)
            .max(0.0);
        // Older than the process clock reaches back; no recency bonus either way
        self.last_activity =
            Instant::now().checked_sub(Duration::from_secs_f64(age_minutes * 60.0));
    }

    fn minutes_since_activity(&self) -> Option<f64> {
        self.last_activity.map(|at| at.elapsed().as_secs_f64() / 60.0)
    }

    fn daily_count(&self, activity: ActivityType) -> u32 {
        let server = self
            .stats
            .as_ref()
            .and_then(|s| s.daily.count(activity))
            .unwrap_or(0);
        server.saturating_add(self.local_counts.get(&activity).copied().unwrap_or(0))
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_mining: self.is_mining,
            elapsed_seconds: self.elapsed_seconds,
            total_earnings: self.ledger.displayed(),
            combo_multiplier: self.combo.value(),
            efficiency: self.efficiency,
            queued_activities: self.queue.len(),
            pending: self.pending.iter().copied().collect(),
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(Default)]
struct Timers {
    ticker: Option<JoinHandle<()>>,
    efficiency: Option<JoinHandle<()>>,
    flush: Option<(Instant, JoinHandle<()>)>,
}

impl Timers {
    fn abort_all(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(handle) = self.efficiency.take() {
            handle.abort();
        }
        if let Some((_, handle)) = self.flush.take() {
            handle.abort();
        }
    }
}

enum NextDrain {
    Nothing,
    Arm(Instant),
    Dispatch(Batch, FlightToken, DeltaId),
}

struct Inner {
    backend: Arc<dyn MiningBackend>,
    config: MiningConfig,
    state: Mutex<SessionState>,
    timers: Mutex<Timers>,
    reconciler: ReconciliationLoop,
    snapshots: watch::Sender<SessionSnapshot>,
    notices: broadcast::Sender<Notice>,
    shut_down: AtomicBool,
}

/// Cloneable handle; all clones drive the same session.
#[derive(Clone)]
pub struct MiningSessionController {
    inner: Arc<Inner>,
}

impl MiningSessionController {
    pub fn new(backend: Arc<dyn MiningBackend>, config: MiningConfig) -> Self {
        let state = SessionState::new(&config);
        let (snapshots, _) = watch::channel(state.snapshot());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let reconciler = ReconciliationLoop::new(config.reconcile_interval, config.send_heartbeat);

        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                state: Mutex::new(state),
                timers: Mutex::new(Timers::default()),
                reconciler,
                snapshots,
                notices,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &MiningConfig {
        &self.inner.config
    }

    /// Set or clear the signed-in user.
    pub fn set_user(&self, user_id: Option<UserId>) {
        self.inner.state.lock().user_id = user_id;
    }

    /// Start background timers: efficiency recompute (immediately, then on its
    /// interval) and, if a session is open, the elapsed ticker and
    /// reconciliation loop.
    pub fn mount(&self) {
        self.inner.spawn_efficiency_timer();
        if self.inner.state.lock().is_mining {
            self.inner.start_session_timers();
        }
    }

    /// Tear down every timer. Calls still in flight may complete but no
    /// longer touch session state.
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.timers.lock().abort_all();
        self.inner.reconciler.stop();
        info!("Mining controller shut down");
    }

    /// Start mining when idle, stop when mining.
    ///
    /// Calls inside the throttle window fail with [`MiningError::Throttled`];
    /// calls while another toggle is awaiting the backend fail with
    /// [`MiningError::ToggleInFlight`]. Nothing is retried.
    pub async fn toggle_mining(&self) -> MiningResult<MiningTransition> {
        self.inner.toggle().await
    }

    /// Register a user interaction while mining.
    ///
    /// Returns as soon as the entry is queued; the backend sees it when the
    /// queue drains. `tokens` is scaled by the combo multiplier in effect now.
    pub fn on_interaction(
        &self,
        activity: ActivityType,
        points: u64,
        tokens: f64,
    ) -> MiningResult<()> {
        let inner = &self.inner;
        if inner.is_shut_down() {
            return Err(MiningError::ShutDown);
        }
        if !tokens.is_finite() || tokens < 0.0 {
            return Err(MiningError::InvalidAmount(format!("{tokens} tokens")));
        }

        {
            let mut state = inner.state.lock();
            if !state.is_mining {
                return Err(MiningError::NotMining);
            }
            if let Some(limit) = inner.config.daily_limits.limit_for(activity) {
                if state.daily_count(activity) >= limit {
                    debug!(%activity, limit, "Daily limit reached");
                    return Err(MiningError::DailyLimitReached { activity, limit });
                }
            }
            state.pending.insert(activity);
        }
        let _indicator = PendingIndicator {
            inner: inner.as_ref(),
            activity,
        };

        {
            let mut state = inner.state.lock();
            let tokens = state.combo.apply(tokens);
            state.queue.push(ActivityEntry {
                activity,
                points,
                tokens,
                enqueued_at: Instant::now(),
            });
            *state.local_counts.entry(activity).or_insert(0) += 1;
            state.mark_activity();
            debug!(%activity, points, tokens, queued = state.queue.len(), "Activity queued");
        }

        inner.recompute_efficiency();
        inner.publish_snapshot();
        inner.inspect_queue();
        Ok(())
    }

    /// Ask the server whether this user is mining. A disagreement is logged
    /// and published as [`SyncEvent::ChangedExternally`] but not acted on.
    pub async fn sync(&self) -> MiningResult<bool> {
        self.inner.sync_state().await
    }

    /// Full refetch: replaces cached stats, reconciles earnings with the
    /// server total and adopts the server's mining flag.
    pub async fn refresh_stats(&self) -> MiningResult<MiningStats> {
        self.inner.refresh().await
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.inner.notify(notice);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    pub fn sync_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.reconciler.subscribe()
    }

    pub fn is_mining(&self) -> bool {
        self.inner.state.lock().is_mining
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.inner.state.lock().elapsed_seconds
    }

    pub fn total_earnings(&self) -> f64 {
        self.inner.state.lock().ledger.displayed()
    }

    pub fn combo_multiplier(&self) -> f64 {
        self.inner.state.lock().combo.value()
    }

    pub fn efficiency(&self) -> f64 {
        self.inner.state.lock().efficiency
    }

    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_interaction_pending(&self, activity: ActivityType) -> bool {
        self.inner.state.lock().pending.contains(&activity)
    }

    pub fn stats(&self) -> Option<MiningStats> {
        self.inner.state.lock().stats.clone()
    }
}

/// Clears the in-progress marker for an interaction type when dropped.
struct PendingIndicator<'a> {
    inner: &'a Inner,
    activity: ActivityType,
}

impl Drop for PendingIndicator<'_> {
    fn drop(&mut self) {
        self.inner.state.lock().pending.remove(&self.activity);
        self.inner.publish_snapshot();
    }
}

impl Inner {
    fn user_id(&self) -> MiningResult<UserId> {
        self.state
            .lock()
            .user_id
            .clone()
            .ok_or(MiningError::NotAuthenticated)
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> MiningResult<T> {
        let after = self.config.request_timeout;
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result.map_err(MiningError::backend),
            Err(_) => {
                warn!(
                    operation,
                    timeout_secs = after.as_secs_f64(),
                    "Backend call timed out"
                );
                Err(MiningError::Timeout { operation, after })
            }
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = self.state.lock().snapshot();
        self.snapshots.send_replace(snapshot);
    }

    fn notify(&self, notice: Notice) {
        debug!(level = ?notice.level, message = %notice.message, "Notice");
        let _ = self.notices.send(notice);
    }

    fn recompute_efficiency(&self) {
        let mut state = self.state.lock();
        let streak_days = state.stats.as_ref().map_or(0, |s| s.streak_days);
        let value = efficiency(streak_days, state.minutes_since_activity());
        if value != state.efficiency {
            debug!(efficiency = value, streak_days, "Efficiency updated");
        }
        state.efficiency = value;
    }

    fn spawn_efficiency_timer(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let period = self.config.efficiency_interval;
        let handle = tokio::spawn(async move {
            // First tick fires immediately
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.recompute_efficiency();
                inner.publish_snapshot();
            }
        });
        if let Some(old) = self.timers.lock().efficiency.replace(handle) {
            old.abort();
        }
    }

    fn spawn_ticker(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let period = self.config.tick_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                {
                    let mut state = inner.state.lock();
                    let started_at = match (state.is_mining, state.started_at) {
                        (true, Some(at)) => at,
                        _ => break,
                    };
                    state.elapsed_seconds = started_at.elapsed().as_secs();
                }
                inner.publish_snapshot();
            }
        });
        if let Some(old) = self.timers.lock().ticker.replace(handle) {
            old.abort();
        }
    }

    fn start_session_timers(self: &Arc<Self>) {
        self.spawn_ticker();
        self.reconciler.start(Arc::downgrade(self));
    }

    fn stop_session_timers(&self) {
        if let Some(handle) = self.timers.lock().ticker.take() {
            handle.abort();
        }
        self.reconciler.stop();
    }

    async fn toggle(self: &Arc<Self>) -> MiningResult<MiningTransition> {
        let (user_id, was_mining, token) = {
            let mut state = self.state.lock();
            let Some(user_id) = state.user_id.clone() else {
                drop(state);
                self.notify(Notice::error(MiningError::NotAuthenticated.to_string()));
                return Err(MiningError::NotAuthenticated);
            };
            if state.toggle_guard.is_busy() {
                debug!("Toggle rejected: another toggle is in flight");
                return Err(MiningError::ToggleInFlight);
            }
            if !state.toggle_throttle.try_pass() {
                debug!("Toggle dropped by throttle");
                return Err(MiningError::Throttled);
            }
            let token = state
                .toggle_guard
                .try_acquire()
                .ok_or(MiningError::ToggleInFlight)?;
            (user_id, state.is_mining, token)
        };

        let result = if was_mining {
            self.call("stop_mining", self.backend.stop_mining(&user_id))
                .await
                .and_then(|ok| {
                    ok.then_some(MiningTransition::Stopped)
                        .ok_or(MiningError::Rejected("stop_mining"))
                })
        } else {
            self.call("start_mining", self.backend.start_mining(&user_id))
                .await
                .and_then(|ok| {
                    ok.then_some(MiningTransition::Started)
                        .ok_or(MiningError::Rejected("start_mining"))
                })
        };

        self.state.lock().toggle_guard.release(token);
        if self.is_shut_down() {
            return result;
        }

        match &result {
            Ok(MiningTransition::Started) => {
                {
                    let mut state = self.state.lock();
                    state.begin_session();
                    state.mark_activity();
                }
                info!(user_id = %user_id, "Mining started");
                self.start_session_timers();
                self.recompute_efficiency();
                self.notify(Notice::success("Mining started"));
            }
            Ok(MiningTransition::Stopped) => {
                self.state.lock().end_session();
                self.stop_session_timers();
                info!(user_id = %user_id, "Mining stopped");
                self.notify(Notice::success("Mining stopped"));
            }
            Err(e) => {
                error!(user_id = %user_id, was_mining, error = %e, "Mining toggle failed");
                let action = if was_mining { "stop" } else { "start" };
                self.notify(Notice::error(format!("Failed to {action} mining: {e}")));
            }
        }
        self.publish_snapshot();
        result
    }

    /// Flush the queue if the drain policy says so, otherwise arm a timer for
    /// the oldest entry. A drain already in flight re-inspects when it settles.
    fn inspect_queue(self: &Arc<Self>) {
        if self.is_shut_down() {
            return;
        }
        let policy = self.config.drain_policy();

        let next = {
            let mut state = self.state.lock();
            if state.drain_guard.is_busy() {
                return;
            }
            let decision = state.queue.inspect(&policy, Instant::now());
            match decision {
                DrainDecision::Idle => NextDrain::Nothing,
                DrainDecision::WaitUntil(deadline) => NextDrain::Arm(deadline),
                DrainDecision::Flush => match state.drain_guard.try_acquire() {
                    None => NextDrain::Nothing,
                    Some(token) => {
                        let batch = state.queue.take_batch();
                        let delta = state.ledger.apply(batch.total_tokens());
                        NextDrain::Dispatch(batch, token, delta)
                    }
                },
            }
        };

        match next {
            NextDrain::Nothing => {}
            NextDrain::Arm(deadline) => self.arm_flush_timer(deadline),
            NextDrain::Dispatch(batch, token, delta) => {
                debug!(
                    batch_size = batch.len(),
                    tokens = batch.total_tokens(),
                    "Draining activity queue"
                );
                self.publish_snapshot();
                tokio::spawn(self.clone().submit_batch(batch, token, delta));
            }
        }
    }

    fn arm_flush_timer(self: &Arc<Self>, deadline: Instant) {
        let mut timers = self.timers.lock();
        if let Some((armed, handle)) = &timers.flush {
            if *armed <= deadline && !handle.is_finished() {
                return;
            }
        }

        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Some(inner) = weak.upgrade() else { return };
            {
                let mut timers = inner.timers.lock();
                if matches!(timers.flush, Some((armed, _)) if armed == deadline) {
                    timers.flush = None;
                }
            }
            inner.inspect_queue();
        });
        if let Some((_, old)) = timers.flush.replace((deadline, handle)) {
            old.abort();
        }
    }

    async fn send_batch(&self, batch: &Batch) -> MiningResult<()> {
        let user_id = self.user_id()?;
        match batch.submission(self.config.batch_submission) {
            None => Ok(()),
            Some(Submission::Single(activity)) | Some(Submission::Aggregate(activity)) => {
                let outcome = self
                    .call(
                        "record_activity",
                        self.backend.record_activity(&user_id, &activity),
                    )
                    .await?;
                if outcome.is_accepted() {
                    Ok(())
                } else {
                    Err(MiningError::Rejected("record_activity"))
                }
            }
            Some(Submission::Itemized(activities)) => {
                let result = self
                    .call(
                        "batch_record_activities",
                        self.backend.batch_record_activities(&user_id, &activities),
                    )
                    .await?;
                if result.success {
                    Ok(())
                } else {
                    Err(MiningError::Rejected("batch_record_activities"))
                }
            }
        }
    }

    async fn submit_batch(self: Arc<Self>, batch: Batch, token: FlightToken, delta: DeltaId) {
        let outcome = self.send_batch(&batch).await;
        if self.is_shut_down() {
            debug!(batch_size = batch.len(), "Discarding drain result after shutdown");
            return;
        }

        match outcome {
            Ok(()) => {
                let combo = {
                    let mut state = self.state.lock();
                    state.ledger.confirm(delta);
                    state.mark_activity();
                    state.combo.bump()
                };
                self.recompute_efficiency();
                info!(
                    batch_size = batch.len(),
                    points = batch.total_points(),
                    tokens = batch.total_tokens(),
                    combo,
                    "Activity batch recorded"
                );
                self.schedule_sync(self.config.post_flush_sync_delay);
            }
            Err(e) => {
                // Dropped, not re-enqueued: the backend has no idempotency keys
                let rolled_back = self.state.lock().ledger.rollback(delta).unwrap_or(0.0);
                error!(
                    batch_size = batch.len(),
                    rolled_back,
                    error = %e,
                    "Failed to record activity batch"
                );
                self.notify(Notice::error(format!("Failed to record activity: {e}")));
            }
        }

        self.state.lock().drain_guard.release(token);
        self.publish_snapshot();
        self.inspect_queue();
    }

    fn schedule_sync(self: &Arc<Self>, delay: Duration) {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                if !inner.is_shut_down() {
                    let _ = inner.sync_state().await;
                }
            }
        });
    }

    async fn sync_state(&self) -> MiningResult<bool> {
        let user_id = self.user_id()?;
        let result = self
            .call(
                "check_mining_status",
                self.backend.check_mining_status(&user_id),
            )
            .await;
        if self.is_shut_down() {
            return result;
        }

        let local = self.state.lock().is_mining;
        let event = match &result {
            Ok(remote) if *remote == local => {
                debug!(user_id = %user_id, is_mining = local, "Mining state in sync");
                SyncEvent::InSync { is_mining: local }
            }
            Ok(remote) => {
                warn!(
                    user_id = %user_id,
                    local,
                    remote = *remote,
                    "Mining state changed externally"
                );
                SyncEvent::ChangedExternally {
                    local,
                    remote: *remote,
                }
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Mining state sync failed");
                SyncEvent::Failed {
                    error: e.to_string(),
                }
            }
        };
        self.reconciler.publish(event);
        result
    }

    async fn refresh(self: &Arc<Self>) -> MiningResult<MiningStats> {
        let user_id = self.user_id()?;
        let stats = self
            .call("get_mining_stats", self.backend.get_mining_stats(&user_id))
            .await
            .inspect_err(|e| warn!(user_id = %user_id, error = %e, "Failed to refresh mining stats"))?;
        if self.is_shut_down() {
            return Ok(stats);
        }

        let transition = {
            let mut state = self.state.lock();
            state.ledger.reconcile(stats.total_tokens_earned);
            state.local_counts.clear();
            if let Some(server_last) = stats.last_activity_at {
                state.adopt_server_activity(server_last);
            }
            let local = state.is_mining;
            state.stats = Some(stats.clone());
            match (local, stats.is_mining) {
                (false, true) => {
                    state.begin_session();
                    Some(MiningTransition::Started)
                }
                (true, false) => {
                    state.end_session();
                    Some(MiningTransition::Stopped)
                }
                _ => None,
            }
        };

        match transition {
            Some(MiningTransition::Started) => {
                warn!(user_id = %user_id, "Server reports an active session, resuming mining");
                self.start_session_timers();
                self.notify(Notice::info("Mining resumed from another session"));
            }
            Some(MiningTransition::Stopped) => {
                warn!(user_id = %user_id, "Server reports mining stopped, ending local session");
                self.stop_session_timers();
                self.notify(Notice::info("Mining was stopped on the server"));
            }
            None => {}
        }

        self.recompute_efficiency();
        self.publish_snapshot();
        Ok(stats)
    }
}

#[async_trait]
impl StateSync for Inner {
    async fn heartbeat(&self) -> MiningResult<bool> {
        let user_id = self.user_id()?;
        self.call("send_heartbeat", self.backend.send_heartbeat(&user_id))
            .await
    }

    async fn sync(&self) -> MiningResult<bool> {
        self.sync_state().await
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.timers.get_mut().abort_all();
    }
}

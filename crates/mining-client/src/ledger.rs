//! Optimistic earnings ledger
//!
//! Token earnings are shown before the backend confirms them. Each optimistic
//! bump is recorded as a pending delta under its own id so it can later be
//! confirmed or rolled back exactly, even when several batches overlap.
//!
//! ## Phases
//! - `apply`: tentative add, returns the delta id
//! - `confirm`: the backend accepted it; the delta stays visible until the next
//!   server snapshot accounts for it
//! - `rollback`: the backend failed; the delta is removed
//! - `reconcile`: a fresh server total replaces everything already confirmed

use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeltaId(u64);

#[derive(Debug, Default)]
pub struct OptimisticLedger {
    /// Last server-reported total
    confirmed: f64,
    /// Accepted by the backend but not yet reflected in a server snapshot
    settled: f64,
    pending: HashMap<DeltaId, f64>,
    next_id: u64,
    reconciled: bool,
}

impl OptimisticLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tentatively add `delta` to the displayed total. Negative deltas are
    /// clamped to zero so the displayed total never drops below the last
    /// confirmed value.
    pub fn apply(&mut self, delta: f64) -> DeltaId {
        let id = DeltaId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, delta.max(0.0));
        id
    }

    pub fn confirm(&mut self, id: DeltaId) -> Option<f64> {
        let delta = self.pending.remove(&id)?;
        self.settled += delta;
        Some(delta)
    }

    pub fn rollback(&mut self, id: DeltaId) -> Option<f64> {
        let delta = self.pending.remove(&id);
        if delta.is_none() {
            debug!(?id, "Rollback of unknown delta ignored");
        }
        delta
    }

    /// Adopt a server-confirmed total. Deltas still in flight stay on top.
    pub fn reconcile(&mut self, server_total: f64) {
        self.confirmed = server_total;
        self.settled = 0.0;
        self.reconciled = true;
    }

    pub fn displayed(&self) -> f64 {
        self.confirmed + self.settled + self.pending.values().sum::<f64>()
    }

    pub fn confirmed(&self) -> f64 {
        self.confirmed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether a server total has been adopted at least once.
    pub fn is_reconciled(&self) -> bool {
        self.reconciled
    }
}

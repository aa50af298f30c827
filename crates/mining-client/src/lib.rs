//! Mining Client
//!
//! Client-side state machine for social mining sessions. Provides:
//! - Session start/stop with throttled, single-flight toggles
//! - Activity batching with optimistic earnings and rollback
//! - Combo and efficiency multipliers
//! - Periodic reconciliation with the server's mining flag
//!
//! ## Ownership
//!
//! The server owns mining state. [`MiningSessionController`] keeps a local
//! belief that is corrected by stats refreshes; a sync only reports drift
//! through [`SyncEvent`]s.
//!
//! The backend is reached through [`MiningBackend`]; [`HttpMiningBackend`] is
//! the REST implementation.

pub mod backend;
pub mod combo;
pub mod config;
pub mod controller;
pub mod efficiency;
pub mod errors;
pub mod guard;
pub mod http;
pub mod ledger;
pub mod queue;
pub mod reconcile;
pub mod stats;
pub mod types;
pub mod watchdog;

#[cfg(test)]
mod testing;

pub use backend::MiningBackend;
pub use combo::ComboMultiplier;
pub use config::{BatchSubmission, DailyLimits, MiningConfig};
pub use controller::{MiningSessionController, MiningTransition, SessionSnapshot};
pub use errors::{MiningError, MiningResult};
pub use guard::{FlightToken, GuardState, InFlightGuard, Throttle};
pub use http::HttpMiningBackend;
pub use ledger::{DeltaId, OptimisticLedger};
pub use queue::{ActivityQueue, Batch, DrainDecision, DrainPolicy, Submission};
pub use reconcile::{ReconciliationLoop, StateSync, SyncEvent};
pub use stats::StatsError;
pub use types::*;
pub use watchdog::MiningHealthWatchdog;

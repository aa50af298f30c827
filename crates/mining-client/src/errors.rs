//! Mining client error types

use crate::stats::StatsError;
use crate::types::ActivityType;
use std::time::Duration;

/// Errors surfaced by the mining session controller.
///
/// The first group is user-actionable: the operation refuses to proceed and the
/// message is meant to be shown as-is. The second group covers transient
/// backend failures, which are logged and reported but never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MiningError {
    #[error("Please sign in to start mining")]
    NotAuthenticated,
    #[error("Mining is not active")]
    NotMining,
    #[error("Daily limit reached for {activity} ({limit} per day)")]
    DailyLimitReached { activity: ActivityType, limit: u32 },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Please wait before toggling mining again")]
    Throttled,
    #[error("A mining toggle is already in progress")]
    ToggleInFlight,
    #[error("Mining session has been shut down")]
    ShutDown,

    #[error("Mining backend error: {0}")]
    Backend(String),
    #[error("Mining backend rejected {0}")]
    Rejected(&'static str),
    #[error("{operation} timed out after {}s", .after.as_secs_f64())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("Invalid mining stats: {0}")]
    InvalidStats(#[from] StatsError),
}

impl MiningError {
    /// Wrap a backend failure, keeping the whole context chain in the message.
    /// A stats payload that failed validation keeps its typed error.
    pub fn backend(err: anyhow::Error) -> Self {
        match err.downcast_ref::<StatsError>() {
            Some(stats) => Self::InvalidStats(stats.clone()),
            None => Self::Backend(format!("{err:#}")),
        }
    }

    /// Whether the user can resolve this error themselves.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::NotMining
                | Self::DailyLimitReached { .. }
                | Self::InvalidAmount(_)
                | Self::Throttled
                | Self::ToggleInFlight
        )
    }
}

/// Result type for mining operations.
pub type MiningResult<T> = Result<T, MiningError>;

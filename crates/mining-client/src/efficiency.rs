//! Mining efficiency model
//!
//! `efficiency = 1.0 + streak bonus + recency bonus`, rounded to hundredths.
//! The streak bonus grows 0.05 per consecutive day up to 0.2; the recency bonus
//! starts at 0.2 right after an activity and decays linearly to zero over five
//! minutes. The value is advisory and never gates queue behaviour.

use chrono::{DateTime, Utc};

pub const STREAK_BONUS_PER_DAY: f64 = 0.05;
pub const MAX_STREAK_BONUS: f64 = 0.2;
pub const MAX_RECENCY_BONUS: f64 = 0.2;
pub const RECENCY_WINDOW_MINUTES: f64 = 5.0;

pub fn streak_bonus(streak_days: u32) -> f64 {
    (f64::from(streak_days) * STREAK_BONUS_PER_DAY).min(MAX_STREAK_BONUS)
}

/// Bonus for recent activity. Timestamps in the future (clock skew) count as
/// "just now".
pub fn recency_bonus(minutes_since_last_activity: Option<f64>) -> f64 {
    match minutes_since_last_activity {
        Some(minutes) if minutes < RECENCY_WINDOW_MINUTES => {
            MAX_RECENCY_BONUS * (1.0 - minutes.max(0.0) / RECENCY_WINDOW_MINUTES)
        }
        _ => 0.0,
    }
}

pub fn efficiency(streak_days: u32, minutes_since_last_activity: Option<f64>) -> f64 {
    round_hundredths(
        1.0 + streak_bonus(streak_days) + recency_bonus(minutes_since_last_activity),
    )
}

pub fn minutes_since(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<f64> {
    last_activity.map(|at| (now - at).num_milliseconds() as f64 / 60_000.0)
}

pub(crate) fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Core mining types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;

/// Identifier of the signed-in user, as issued by the backend.
pub type UserId = String;

/// Kind of user interaction that earns mining rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Post,
    Comment,
    Like,
    Share,
    Invite,
    Login,
}

impl ActivityType {
    pub const ALL: [ActivityType; 6] = [
        ActivityType::Post,
        ActivityType::Comment,
        ActivityType::Like,
        ActivityType::Share,
        ActivityType::Invite,
        ActivityType::Login,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Like => "like",
            Self::Share => "share",
            Self::Invite => "invite",
            Self::Login => "login",
        }
    }

    /// Standard `(points, tokens)` reward for one interaction of this kind.
    pub fn default_reward(&self) -> (u64, f64) {
        match self {
            Self::Post => (10, 1.0),
            Self::Comment => (5, 0.5),
            Self::Like => (1, 0.1),
            Self::Share => (3, 0.3),
            Self::Invite => (20, 2.0),
            Self::Login => (2, 0.2),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity type: {0}")]
pub struct UnknownActivity(pub String);

impl FromStr for ActivityType {
    type Err = UnknownActivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == needle)
            .ok_or_else(|| UnknownActivity(s.to_string()))
    }
}

/// Per-category interaction counts for the current day, as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounters {
    pub posts: u32,
    pub comments: u32,
    pub likes: u32,
    pub shares: u32,
    pub invites: u32,
}

impl DailyCounters {
    /// Count for a capped category; `None` for activities without a daily counter.
    pub fn count(&self, activity: ActivityType) -> Option<u32> {
        match activity {
            ActivityType::Post => Some(self.posts),
            ActivityType::Comment => Some(self.comments),
            ActivityType::Like => Some(self.likes),
            ActivityType::Share => Some(self.shares),
            ActivityType::Invite => Some(self.invites),
            ActivityType::Login => None,
        }
    }
}

/// Server-owned mining totals. The client keeps a cached copy refreshed by
/// full refetches; see [`MiningStats::from_value`] for the accepted shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiningStats {
    pub total_points: u64,
    pub total_tokens_earned: f64,
    pub daily_points: u64,
    pub daily_tokens_earned: f64,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub mining_rate: f64,
    pub efficiency_multiplier: f64,
    pub streak_days: u32,
    pub daily: DailyCounters,
    pub is_mining: bool,
    pub is_mining_healthy: bool,
}

impl Default for MiningStats {
    fn default() -> Self {
        Self {
            total_points: 0,
            total_tokens_earned: 0.0,
            daily_points: 0,
            daily_tokens_earned: 0.0,
            last_activity_at: None,
            mining_rate: 0.0,
            efficiency_multiplier: 1.0,
            streak_days: 0,
            daily: DailyCounters::default(),
            is_mining: false,
            is_mining_healthy: true,
        }
    }
}

/// A locally generated interaction waiting to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub activity: ActivityType,
    pub points: u64,
    /// Already multiplied by the combo multiplier in effect at enqueue time.
    pub tokens: f64,
    pub enqueued_at: Instant,
}

/// Activity payload sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySubmission {
    #[serde(rename = "activity_type")]
    pub activity: ActivityType,
    pub points: u64,
    pub tokens: f64,
}

impl From<&ActivityEntry> for ActivitySubmission {
    fn from(entry: &ActivityEntry) -> Self {
        Self {
            activity: entry.activity,
            points: entry.points,
            tokens: entry.tokens,
        }
    }
}

/// Server acknowledgement of a recorded activity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivityRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(rename = "activity_type")]
    pub activity: ActivityType,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub tokens: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of a single `record_activity` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Recorded; the server may or may not echo the stored record.
    Accepted(Option<ActivityRecord>),
    Rejected,
}

impl RecordOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct BatchRecordResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A short user-facing message (the UI renders these as toasts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

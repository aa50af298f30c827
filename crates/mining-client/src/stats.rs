//! Typed parsing of server-reported mining stats
//!
//! The backend has shipped several payload shapes over time (decimal fields as
//! strings, missing counters, `null` timestamps). Parsing is strict about what
//! matters: the lifetime totals must be present, every present field must have
//! a sensible type, and amounts may not be negative. Optional counters and
//! flags fall back to neutral values.

use crate::types::{DailyCounters, MiningStats};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("stats payload must be a JSON object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl MiningStats {
    /// Parse a stats payload. Accepts either the bare object or one wrapped in
    /// a `{"stats": {...}}` envelope.
    pub fn from_value(value: &Value) -> Result<Self, StatsError> {
        let object = value.as_object().ok_or(StatsError::NotAnObject)?;
        let object = match object.get("stats") {
            Some(Value::Object(inner)) => inner,
            _ => object,
        };
        let fields = Fields(object);

        Ok(Self {
            total_points: fields.required_count("total_points")?,
            total_tokens_earned: fields.required_amount("total_tokens_earned")?,
            daily_points: fields.count("daily_points")?,
            daily_tokens_earned: fields.amount("daily_tokens_earned")?,
            last_activity_at: fields.timestamp("last_activity_at")?,
            mining_rate: fields.amount("mining_rate")?,
            efficiency_multiplier: fields.number("efficiency_multiplier")?.unwrap_or(1.0),
            streak_days: fields.small_count("streak_days")?,
            daily: DailyCounters {
                posts: fields.small_count("daily_posts_count")?,
                comments: fields.small_count("daily_comments_count")?,
                likes: fields.small_count("daily_likes_count")?,
                shares: fields.small_count("daily_shares_count")?,
                invites: fields.small_count("daily_invites_count")?,
            },
            is_mining: fields.flag("is_mining", false)?,
            is_mining_healthy: fields.flag("is_mining_healthy", true)?,
        })
    }
}

struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn number(&self, field: &'static str) -> Result<Option<f64>, StatsError> {
        let parsed = match self.0.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| invalid(field, format!("unrepresentable number {n}")))?,
            // Decimal columns are serialized as strings
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid(field, format!("not a number: {s:?}")))?,
            Some(other) => {
                return Err(invalid(
                    field,
                    format!("expected a number, found {}", kind(other)),
                ))
            }
        };

        if !parsed.is_finite() {
            return Err(invalid(field, "not finite".to_string()));
        }
        if parsed < 0.0 {
            return Err(invalid(field, format!("negative value {parsed}")));
        }
        Ok(Some(parsed))
    }

    fn amount(&self, field: &'static str) -> Result<f64, StatsError> {
        Ok(self.number(field)?.unwrap_or(0.0))
    }

    fn required_amount(&self, field: &'static str) -> Result<f64, StatsError> {
        self.number(field)?.ok_or(StatsError::MissingField(field))
    }

    fn integral(field: &'static str, value: f64) -> Result<u64, StatsError> {
        if value.fract() != 0.0 {
            return Err(invalid(field, format!("expected an integer, found {value}")));
        }
        // u64::MAX as f64 rounds up to 2^64, which is already out of range
        if value >= u64::MAX as f64 {
            return Err(invalid(field, format!("{value} out of range")));
        }
        Ok(value as u64)
    }

    fn count(&self, field: &'static str) -> Result<u64, StatsError> {
        match self.number(field)? {
            Some(value) => Self::integral(field, value),
            None => Ok(0),
        }
    }

    fn required_count(&self, field: &'static str) -> Result<u64, StatsError> {
        let value = self.number(field)?.ok_or(StatsError::MissingField(field))?;
        Self::integral(field, value)
    }

    fn small_count(&self, field: &'static str) -> Result<u32, StatsError> {
        let value = self.count(field)?;
        u32::try_from(value).map_err(|_| invalid(field, format!("{value} out of range")))
    }

    fn flag(&self, field: &'static str, default: bool) -> Result<bool, StatsError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(invalid(
                field,
                format!("expected a boolean, found {}", kind(other)),
            )),
        }
    }

    fn timestamp(&self, field: &'static str) -> Result<Option<DateTime<Utc>>, StatsError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| invalid(field, format!("bad timestamp {s:?}: {e}"))),
            Some(other) => Err(invalid(
                field,
                format!("expected an RFC 3339 string, found {}", kind(other)),
            )),
        }
    }
}

fn invalid(field: &'static str, reason: String) -> StatsError {
    StatsError::InvalidField { field, reason }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

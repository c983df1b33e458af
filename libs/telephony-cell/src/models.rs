// libs/telephony-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// CALL / SMS MIRRORS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
        }
    }
}

/// Mirror of one provider call event. `call_sid` is the provider's unique
/// identifier and the upsert key; re-syncing the same window must not
/// create a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_sid: String,
    pub from_number: String,
    pub to_number: String,
    pub direction: Direction,
    pub status: String,
    pub duration_seconds: i64,
    pub started_at: DateTime<Utc>,
}

/// Mirror of one provider SMS event, keyed by `message_sid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsRecord {
    pub message_sid: String,
    pub from_number: String,
    pub to_number: String,
    pub direction: Direction,
    pub status: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

// ==============================================================================
// ANALYTICS
// ==============================================================================

/// Derived rollup for one calendar date. Not a source of truth; the daily
/// job recomputes and overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAnalytics {
    pub date: NaiveDate,
    pub call_count: i64,
    pub appointment_count: i64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TelephonyError {
    #[error("Telephony provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<reqwest::Error> for TelephonyError {
    fn from(e: reqwest::Error) -> Self {
        TelephonyError::Provider(e.to_string())
    }
}

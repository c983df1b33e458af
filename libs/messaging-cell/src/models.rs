// libs/messaging-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use calendar_cell::models::CalendarError;

// ==============================================================================
// COMMAND MODELS
// ==============================================================================

/// What an inbound message is asking for. Classification is keyword
/// containment checked in this order; the first family that matches wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsIntent {
    Cancel,
    Reschedule,
    Confirm,
    Help,
}

/// Coarse tag stored with each interaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SmsAction {
    Cancellation,
    Info,
}

impl fmt::Display for SmsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmsAction::Cancellation => write!(f, "cancellation"),
            SmsAction::Info => write!(f, "info"),
        }
    }
}

/// Append-only audit row: one inbound message, the reply we composed, and
/// what we did about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsInteraction {
    pub phone: String,
    pub incoming_message: String,
    pub outgoing_message: String,
    pub action_taken: SmsAction,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("Store error: {0}")]
    Store(String),
}

// ==============================================================================
// PHONE NORMALIZATION
// ==============================================================================

/// Keep the digits only.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a provider-formatted sender number for local comparison:
/// digits only, one leading country-code "1" stripped.
pub fn normalize_phone(raw: &str) -> String {
    let cleaned = digits(raw);
    cleaned
        .strip_prefix('1')
        .map(str::to_string)
        .unwrap_or(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_formatting_and_country_code() {
        assert_eq!(normalize_phone("+1 (929) 242-4535"), "9292424535");
        assert_eq!(normalize_phone("929-242-4535"), "9292424535");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn only_one_leading_one_is_dropped() {
        assert_eq!(normalize_phone("+11234567890"), "1234567890");
    }
}

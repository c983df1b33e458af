// libs/calendar-cell/src/models.rs
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// PROVIDER MODELS
// ==============================================================================

/// A practitioner (or chair) with a bookable calendar. Read-only to this
/// cell; rows are maintained by admin tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub slot_duration_minutes: i32,
    pub working_hours: Vec<WorkingWindow>,
}

/// One recurring window of the weekly working-hours template. Times are
/// clock times on the given weekday; the end is exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingWindow {
    /// 0 = Sunday through 6 = Saturday.
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Map chrono's weekday onto the 0 = Sunday convention used by the
/// provider_hours rows.
pub fn day_of_week_index(weekday: Weekday) -> i32 {
    match weekday {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Active appointments are the ones that hold their calendar interval.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub service_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub confirmation_code: String,
    pub booked_via: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl Appointment {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// "Jun 5, 2026" -- the shape used in SMS replies.
    pub fn formatted_date(&self) -> String {
        self.start_time.format("%b %-d, %Y").to_string()
    }

    /// "2:00 PM"
    pub fn formatted_time(&self) -> String {
        self.start_time.format("%-I:%M %p").to_string()
    }
}

/// Input for creating an appointment row. The store assigns the id, the
/// confirmation code and the initial `scheduled` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub provider_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub service_type: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub booked_via: Option<String>,
    pub notes: Option<String>,
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// Result of an atomic slot claim. A lost race is a normal outcome, not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub success: bool,
    pub reason: Option<String>,
}

impl BookingOutcome {
    pub fn booked() -> Self {
        Self { success: true, reason: None }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

/// A free interval offered to the booking flow or a conversational agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub formatted_time: String,
    pub day_name: String,
}

impl OpenSlot {
    pub fn from_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            formatted_time: start.format("%-I:%M %p").to_string(),
            day_name: start.format("%A").to_string(),
            start_time: start,
            end_time: end,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum CalendarError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Database error: {0}")]
    Database(String),
}

// ==============================================================================
// HELPERS
// ==============================================================================

/// Half-open interval overlap: `[s1, e1)` against `[s2, e2)`. An
/// appointment ending exactly when another starts does not conflict.
pub fn intervals_overlap(
    s1: DateTime<Utc>,
    e1: DateTime<Utc>,
    s2: DateTime<Utc>,
    e2: DateTime<Utc>,
) -> bool {
    s1 < e2 && s2 < e1
}

/// Alphabet for confirmation codes. 0/O/1/I are left out so codes survive
/// being read over the phone and typed back by hand.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const CONFIRMATION_CODE_LEN: usize = 6;

pub fn generate_confirmation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CONFIRMATION_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn overlap_is_half_open() {
        let t = |h, m| Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap();
        assert!(intervals_overlap(t(9, 0), t(9, 30), t(9, 15), t(9, 45)));
        assert!(!intervals_overlap(t(9, 0), t(9, 30), t(9, 30), t(10, 0)));
        assert!(!intervals_overlap(t(9, 30), t(10, 0), t(9, 0), t(9, 30)));
    }

    #[test]
    fn confirmation_codes_are_six_safe_chars() {
        for _ in 0..50 {
            let code = generate_confirmation_code();
            assert_eq!(code.len(), CONFIRMATION_CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn appointment_formatting_matches_sms_style() {
        let start = Utc.with_ymd_and_hms(2026, 6, 5, 14, 0, 0).unwrap();
        let appt = Appointment {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            patient_name: "Test Patient".to_string(),
            patient_phone: "555-123-4567".to_string(),
            patient_email: None,
            service_type: "cleaning".to_string(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            status: AppointmentStatus::Scheduled,
            confirmation_code: "AB23CD".to_string(),
            booked_via: None,
            notes: None,
            created_at: start,
            cancelled_at: None,
            cancellation_reason: None,
        };
        assert_eq!(appt.formatted_date(), "Jun 5, 2026");
        assert_eq!(appt.formatted_time(), "2:00 PM");
        assert_eq!(appt.duration_minutes(), 30);
    }
}

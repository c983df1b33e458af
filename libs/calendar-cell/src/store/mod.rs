// libs/calendar-cell/src/store/mod.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, BookingOutcome, CalendarError, NewAppointment, Provider,
};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryCalendarStore;
pub use supabase::SupabaseCalendarStore;

/// Transactional primitives over providers, appointments and slot claims.
///
/// `book_slot` is the one operation that must be atomic: the overlap check
/// and the claim happen inside a single transaction (or a single lock
/// guard), never as separate calls from application code.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Provider, CalendarError>;

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, CalendarError>;

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, CalendarError>;

    /// Case-insensitive lookup restricted to status `scheduled`; the only
    /// status SMS self-service may act on.
    async fn find_scheduled_by_code(
        &self,
        confirmation_code: &str,
    ) -> Result<Option<Appointment>, CalendarError>;

    async fn is_slot_available(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<bool, CalendarError>;

    /// Atomically claim `[start, start + duration)` for the appointment.
    /// Exactly one of any set of concurrent overlapping callers succeeds.
    async fn book_slot(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        appointment_id: Uuid,
        duration_minutes: i32,
    ) -> Result<BookingOutcome, CalendarError>;

    /// Write a new status. Reaching `cancelled` stamps `cancelled_at` and
    /// the reason, and releases the slot claim in the same update.
    async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, CalendarError>;

    /// Non-cancelled appointments starting on the given calendar date.
    /// Feeds the daily analytics rollup.
    async fn count_appointments_on(&self, date: NaiveDate) -> Result<i64, CalendarError>;
}

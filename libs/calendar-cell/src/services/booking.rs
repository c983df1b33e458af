// libs/calendar-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    day_of_week_index, AppointmentStatus, BookingOutcome, CalendarError, OpenSlot,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::CalendarStore;

/// How far ahead the open-slot scan will walk before giving up. Running out
/// of horizon is a normal (short) result, not an error.
const SEARCH_HORIZON_DAYS: i64 = 30;

/// The sole writer of slot state. Availability reads and the atomic claim
/// both go through the store; this service never re-checks what the store
/// already guarantees transactionally.
pub struct SlotBookingService {
    store: Arc<dyn CalendarStore>,
    lifecycle: AppointmentLifecycleService,
}

impl SlotBookingService {
    pub fn new(store: Arc<dyn CalendarStore>) -> Self {
        Self {
            store,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// True iff no active appointment for the provider overlaps
    /// `[start_time, start_time + duration)`.
    pub async fn is_slot_available(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<bool, CalendarError> {
        Self::validate_duration(duration_minutes)?;
        self.store
            .is_slot_available(provider_id, start_time, duration_minutes)
            .await
    }

    /// Attempt to claim the interval for an appointment. Safe under
    /// concurrent callers: the store performs the overlap check and the
    /// insert in one transaction, so exactly one caller wins.
    pub async fn book_slot(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        appointment_id: Uuid,
        duration_minutes: i32,
    ) -> Result<BookingOutcome, CalendarError> {
        Self::validate_duration(duration_minutes)?;

        let outcome = self
            .store
            .book_slot(provider_id, start_time, appointment_id, duration_minutes)
            .await?;

        if outcome.success {
            info!(
                "Booked slot at {} for appointment {} with provider {}",
                start_time, appointment_id, provider_id
            );
        } else {
            debug!(
                "Slot at {} for provider {} lost to a conflict: {:?}",
                start_time, provider_id, outcome.reason
            );
        }

        Ok(outcome)
    }

    /// Walk the provider's weekly working-hours template forward from
    /// `from` in slot-duration increments, skipping intervals that overlap
    /// an active appointment, until `count` slots are found or the horizon
    /// runs out. Returned slots are strictly increasing in start time.
    pub async fn get_next_available_slots(
        &self,
        provider_id: Uuid,
        count: usize,
        from: Option<DateTime<Utc>>,
    ) -> Result<Vec<OpenSlot>, CalendarError> {
        let provider = self.store.get_provider(provider_id).await?;
        Self::validate_duration(provider.slot_duration_minutes)?;

        let slot_len = ChronoDuration::minutes(provider.slot_duration_minutes as i64);
        let from = from.unwrap_or_else(Utc::now);

        let mut windows = provider.working_hours.clone();
        windows.sort_by_key(|w| (w.day_of_week, w.start_time));

        let mut slots: Vec<OpenSlot> = Vec::with_capacity(count);

        'scan: for day_offset in 0..=SEARCH_HORIZON_DAYS {
            let date = (from + ChronoDuration::days(day_offset)).date_naive();
            let dow = day_of_week_index(date.weekday());

            for window in windows.iter().filter(|w| w.day_of_week == dow) {
                let window_end = date.and_time(window.end_time).and_utc();
                let mut candidate = date.and_time(window.start_time).and_utc();

                while candidate + slot_len <= window_end {
                    let candidate_end = candidate + slot_len;

                    if candidate >= from
                        && self
                            .store
                            .is_slot_available(
                                provider_id,
                                candidate,
                                provider.slot_duration_minutes,
                            )
                            .await?
                    {
                        slots.push(OpenSlot::from_interval(candidate, candidate_end));
                        if slots.len() >= count {
                            break 'scan;
                        }
                    }

                    candidate = candidate_end;
                }
            }
        }

        debug!(
            "Found {} open slot(s) for provider {} (requested {})",
            slots.len(),
            provider_id,
            count
        );
        Ok(slots)
    }

    /// Cancel the appointment and free its interval. Idempotent: an already
    /// cancelled appointment is left alone.
    pub async fn cancel_slot(
        &self,
        appointment_id: Uuid,
        reason: &str,
    ) -> Result<(), CalendarError> {
        let appointment = self.store.get_appointment(appointment_id).await?;

        if appointment.status == AppointmentStatus::Cancelled {
            debug!("Appointment {} already cancelled", appointment_id);
            return Ok(());
        }

        self.lifecycle
            .transition(
                self.store.as_ref(),
                appointment_id,
                AppointmentStatus::Cancelled,
                Some(reason.to_string()),
            )
            .await?;

        info!("Appointment {} cancelled: {}", appointment_id, reason);
        Ok(())
    }

    /// Phrase a handful of open slots for the voice/chat agents.
    pub fn format_slots_for_conversation(&self, slots: &[OpenSlot]) -> String {
        if slots.is_empty() {
            return "I don't see any available appointments in the next few weeks.".to_string();
        }

        let today = Utc::now().date_naive();
        let tomorrow = today + ChronoDuration::days(1);

        let mut options: Vec<String> = slots
            .iter()
            .map(|slot| {
                let slot_date = slot.start_time.date_naive();
                let day_text = if slot_date == today {
                    "today".to_string()
                } else if slot_date == tomorrow {
                    "tomorrow".to_string()
                } else {
                    slot.day_name.clone()
                };
                format!("{} at {}", day_text, slot.formatted_time)
            })
            .collect();

        match options.len() {
            1 => format!("I have {} available.", options[0]),
            2 => format!("I have {} or {} available.", options[0], options[1]),
            _ => {
                let last = options.pop().unwrap_or_default();
                format!("I have {}, or {} available.", options.join(", "), last)
            }
        }
    }

    fn validate_duration(duration_minutes: i32) -> Result<(), CalendarError> {
        if duration_minutes <= 0 {
            return Err(CalendarError::InvalidTime(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }
        Ok(())
    }
}

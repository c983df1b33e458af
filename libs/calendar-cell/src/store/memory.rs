// libs/calendar-cell/src/store/memory.rs
//
// Lock-per-store implementation used by the test suites and local tooling.
// Booking atomicity comes from doing the overlap check and the claim under
// one mutex guard, mirroring what the production store gets from its
// database transaction.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    generate_confirmation_code, intervals_overlap, Appointment, AppointmentStatus, BookingOutcome,
    CalendarError, NewAppointment, Provider,
};
use crate::store::CalendarStore;

#[derive(Debug, Clone)]
struct SlotClaim {
    provider_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    appointment_id: Uuid,
}

#[derive(Default)]
struct Inner {
    providers: HashMap<Uuid, Provider>,
    appointments: HashMap<Uuid, Appointment>,
    claims: Vec<SlotClaim>,
}

#[derive(Default)]
pub struct InMemoryCalendarStore {
    inner: Mutex<Inner>,
}

impl InMemoryCalendarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&self, provider: Provider) {
        let mut inner = self.inner.lock().expect("calendar store lock poisoned");
        inner.providers.insert(provider.id, provider);
    }

    fn code_in_use(inner: &Inner, code: &str) -> bool {
        inner.appointments.values().any(|a| {
            a.status.is_active() && a.confirmation_code.eq_ignore_ascii_case(code)
        })
    }
}

#[async_trait]
impl CalendarStore for InMemoryCalendarStore {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Provider, CalendarError> {
        let inner = self.inner.lock().expect("calendar store lock poisoned");
        inner
            .providers
            .get(&provider_id)
            .cloned()
            .ok_or(CalendarError::ProviderNotFound)
    }

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, CalendarError> {
        if new.duration_minutes <= 0 {
            return Err(CalendarError::InvalidTime(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }

        let mut inner = self.inner.lock().expect("calendar store lock poisoned");

        let mut code = generate_confirmation_code();
        while Self::code_in_use(&inner, &code) {
            code = generate_confirmation_code();
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            provider_id: new.provider_id,
            patient_name: new.patient_name,
            patient_phone: new.patient_phone,
            patient_email: new.patient_email,
            service_type: new.service_type,
            start_time: new.start_time,
            end_time: new.start_time + Duration::minutes(new.duration_minutes as i64),
            status: AppointmentStatus::Scheduled,
            confirmation_code: code,
            booked_via: new.booked_via,
            notes: new.notes,
            created_at: Utc::now(),
            cancelled_at: None,
            cancellation_reason: None,
        };

        inner.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, CalendarError> {
        let inner = self.inner.lock().expect("calendar store lock poisoned");
        inner
            .appointments
            .get(&appointment_id)
            .cloned()
            .ok_or(CalendarError::NotFound)
    }

    async fn find_scheduled_by_code(
        &self,
        confirmation_code: &str,
    ) -> Result<Option<Appointment>, CalendarError> {
        let inner = self.inner.lock().expect("calendar store lock poisoned");
        Ok(inner
            .appointments
            .values()
            .find(|a| {
                a.status == AppointmentStatus::Scheduled
                    && a.confirmation_code.eq_ignore_ascii_case(confirmation_code)
            })
            .cloned())
    }

    async fn is_slot_available(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<bool, CalendarError> {
        let end_time = start_time + Duration::minutes(duration_minutes as i64);
        let inner = self.inner.lock().expect("calendar store lock poisoned");

        let taken = inner.claims.iter().any(|claim| {
            claim.provider_id == provider_id
                && intervals_overlap(start_time, end_time, claim.start_time, claim.end_time)
                && inner
                    .appointments
                    .get(&claim.appointment_id)
                    .map(|a| a.status.is_active())
                    .unwrap_or(false)
        });

        Ok(!taken)
    }

    async fn book_slot(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        appointment_id: Uuid,
        duration_minutes: i32,
    ) -> Result<BookingOutcome, CalendarError> {
        let end_time = start_time + Duration::minutes(duration_minutes as i64);
        let mut inner = self.inner.lock().expect("calendar store lock poisoned");

        if !inner.appointments.contains_key(&appointment_id) {
            return Err(CalendarError::NotFound);
        }

        // Check and claim inside the same guard.
        let conflict = inner.claims.iter().any(|claim| {
            claim.provider_id == provider_id
                && claim.appointment_id != appointment_id
                && intervals_overlap(start_time, end_time, claim.start_time, claim.end_time)
                && inner
                    .appointments
                    .get(&claim.appointment_id)
                    .map(|a| a.status.is_active())
                    .unwrap_or(false)
        });

        if conflict {
            return Ok(BookingOutcome::conflict("Time slot is not available"));
        }

        let already_claimed = inner
            .claims
            .iter()
            .any(|c| c.appointment_id == appointment_id);
        if !already_claimed {
            inner.claims.push(SlotClaim {
                provider_id,
                start_time,
                end_time,
                appointment_id,
            });
        }

        Ok(BookingOutcome::booked())
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, CalendarError> {
        let mut inner = self.inner.lock().expect("calendar store lock poisoned");

        let appointment = inner
            .appointments
            .get_mut(&appointment_id)
            .ok_or(CalendarError::NotFound)?;

        appointment.status = status;
        if status == AppointmentStatus::Cancelled {
            appointment.cancelled_at = Some(Utc::now());
            appointment.cancellation_reason = reason;
        }
        let updated = appointment.clone();

        // A cancelled appointment no longer holds its interval.
        if status == AppointmentStatus::Cancelled {
            inner.claims.retain(|c| c.appointment_id != appointment_id);
        }

        Ok(updated)
    }

    async fn count_appointments_on(&self, date: NaiveDate) -> Result<i64, CalendarError> {
        let inner = self.inner.lock().expect("calendar store lock poisoned");
        Ok(inner
            .appointments
            .values()
            .filter(|a| a.status.is_active() && a.start_time.date_naive() == date)
            .count() as i64)
    }
}

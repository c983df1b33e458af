// libs/calendar-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{
    generate_confirmation_code, Appointment, AppointmentStatus, BookingOutcome, CalendarError,
    NewAppointment, Provider, WorkingWindow,
};
use crate::store::CalendarStore;

/// Store backed by the practice's Supabase project. The overlap-sensitive
/// operations go through Postgres functions so the check and the write share
/// one transaction.
pub struct SupabaseCalendarStore {
    supabase: Arc<SupabaseClient>,
}

#[derive(Debug, Deserialize)]
struct ProviderRow {
    id: Uuid,
    name: String,
    slot_duration_minutes: i32,
}

#[derive(Debug, Deserialize)]
struct ProviderHourRow {
    day_of_week: i32,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
struct BookSlotRow {
    success: bool,
    message: Option<String>,
}

impl SupabaseCalendarStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn representation_headers() -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        headers
    }

    fn parse_appointments(rows: Vec<Value>) -> Result<Vec<Appointment>, CalendarError> {
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| CalendarError::Database(format!("Failed to parse appointments: {}", e)))
    }
}

#[async_trait]
impl CalendarStore for SupabaseCalendarStore {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Provider, CalendarError> {
        let path = format!("/rest/v1/providers?id=eq.{}", provider_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        if rows.is_empty() {
            return Err(CalendarError::ProviderNotFound);
        }

        let row: ProviderRow = serde_json::from_value(rows[0].clone())
            .map_err(|e| CalendarError::Database(format!("Failed to parse provider: {}", e)))?;

        let hours_path = format!(
            "/rest/v1/provider_hours?provider_id=eq.{}&order=day_of_week.asc,start_time.asc",
            provider_id
        );
        let hour_rows: Vec<ProviderHourRow> = self
            .supabase
            .request(Method::GET, &hours_path, None)
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        Ok(Provider {
            id: row.id,
            name: row.name,
            slot_duration_minutes: row.slot_duration_minutes,
            working_hours: hour_rows
                .into_iter()
                .map(|h| WorkingWindow {
                    day_of_week: h.day_of_week,
                    start_time: h.start_time,
                    end_time: h.end_time,
                })
                .collect(),
        })
    }

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, CalendarError> {
        if new.duration_minutes <= 0 {
            return Err(CalendarError::InvalidTime(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }

        let end_time = new.start_time + Duration::minutes(new.duration_minutes as i64);
        let now = Utc::now();

        // The confirmation_code column carries a unique constraint; retry
        // with a fresh code if we collide.
        let mut last_err = None;
        for _attempt in 0..3 {
            let code = generate_confirmation_code();
            let appointment_data = json!({
                "provider_id": new.provider_id,
                "patient_name": new.patient_name,
                "patient_phone": new.patient_phone,
                "patient_email": new.patient_email,
                "service_type": new.service_type,
                "start_time": new.start_time.to_rfc3339(),
                "end_time": end_time.to_rfc3339(),
                "status": AppointmentStatus::Scheduled.to_string(),
                "confirmation_code": code,
                "booked_via": new.booked_via,
                "notes": new.notes,
                "created_at": now.to_rfc3339(),
            });

            match self
                .supabase
                .request_with_headers::<Vec<Value>>(
                    Method::POST,
                    "/rest/v1/appointments",
                    Some(appointment_data),
                    Some(Self::representation_headers()),
                )
                .await
            {
                Ok(rows) if !rows.is_empty() => {
                    let appointment: Appointment = serde_json::from_value(rows[0].clone())
                        .map_err(|e| {
                            CalendarError::Database(format!(
                                "Failed to parse created appointment: {}",
                                e
                            ))
                        })?;
                    debug!("Appointment created: {}", appointment.id);
                    return Ok(appointment);
                }
                Ok(_) => {
                    return Err(CalendarError::Database(
                        "Failed to create appointment".to_string(),
                    ))
                }
                Err(e) => {
                    warn!("Appointment insert failed, retrying with new code: {}", e);
                    last_err = Some(e);
                }
            }
        }

        Err(CalendarError::Database(
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Failed to create appointment".to_string()),
        ))
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, CalendarError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        let mut appointments = Self::parse_appointments(rows)?;
        appointments.pop().ok_or(CalendarError::NotFound)
    }

    async fn find_scheduled_by_code(
        &self,
        confirmation_code: &str,
    ) -> Result<Option<Appointment>, CalendarError> {
        let code = confirmation_code.to_uppercase();
        let path = format!(
            "/rest/v1/appointments?confirmation_code=eq.{}&status=eq.scheduled",
            urlencoding::encode(&code)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        let mut appointments = Self::parse_appointments(rows)?;
        Ok(appointments.pop())
    }

    async fn is_slot_available(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<bool, CalendarError> {
        let available: bool = self
            .supabase
            .rpc(
                "is_slot_available",
                json!({
                    "p_provider_id": provider_id,
                    "p_start_time": start_time.to_rfc3339(),
                    "p_duration_minutes": duration_minutes,
                }),
            )
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        Ok(available)
    }

    async fn book_slot(
        &self,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        appointment_id: Uuid,
        duration_minutes: i32,
    ) -> Result<BookingOutcome, CalendarError> {
        debug!(
            "Booking slot for provider {} at {} (appointment {})",
            provider_id, start_time, appointment_id
        );

        let rows: Vec<BookSlotRow> = self
            .supabase
            .rpc(
                "book_appointment_slot",
                json!({
                    "p_provider_id": provider_id,
                    "p_start_time": start_time.to_rfc3339(),
                    "p_appointment_id": appointment_id,
                    "p_duration_minutes": duration_minutes,
                }),
            )
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CalendarError::Database("Empty booking result".to_string()))?;

        if row.success {
            Ok(BookingOutcome::booked())
        } else {
            Ok(BookingOutcome::conflict(
                row.message
                    .unwrap_or_else(|| "Time slot is not available".to_string()),
            ))
        }
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, CalendarError> {
        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(status.to_string()));
        if status == AppointmentStatus::Cancelled {
            update_data.insert("cancelled_at".to_string(), json!(Utc::now().to_rfc3339()));
            update_data.insert("cancellation_reason".to_string(), json!(reason));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(update_data)),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        let mut appointments = Self::parse_appointments(rows)?;
        let updated = appointments.pop().ok_or(CalendarError::NotFound)?;

        // Free the slot row so the interval can be rebooked.
        if status == AppointmentStatus::Cancelled {
            let slot_path = format!(
                "/rest/v1/appointment_slots?appointment_id=eq.{}",
                appointment_id
            );
            let release = json!({ "is_available": true, "appointment_id": null });
            if let Err(e) = self
                .supabase
                .request_with_headers::<Vec<Value>>(
                    Method::PATCH,
                    &slot_path,
                    Some(release),
                    Some(Self::representation_headers()),
                )
                .await
            {
                warn!("Failed to release slot for appointment {}: {}", appointment_id, e);
            }
        }

        Ok(updated)
    }

    async fn count_appointments_on(&self, date: NaiveDate) -> Result<i64, CalendarError> {
        let day_start = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| CalendarError::InvalidTime("Invalid date".to_string()))?
            .and_utc();
        let day_end = day_start + Duration::days(1);

        let path = format!(
            "/rest/v1/appointments?start_time=gte.{}&start_time=lt.{}&status=neq.cancelled&select=id",
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339())
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CalendarError::Database(e.to_string()))?;

        Ok(rows.len() as i64)
    }
}

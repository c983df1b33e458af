// libs/messaging-cell/tests/webhook_test.rs
//
// HTTP surface tests: the provider posts a form, gets an empty 200 back,
// and a 500 only when the store is genuinely down.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use tower::ServiceExt;
use uuid::Uuid;

use calendar_cell::models::{
    Appointment, AppointmentStatus, BookingOutcome, CalendarError, NewAppointment, Provider,
};
use calendar_cell::store::{CalendarStore, InMemoryCalendarStore};
use messaging_cell::handlers::MessagingState;
use messaging_cell::router::messaging_routes;
use messaging_cell::services::interpreter::SmsCommandService;
use messaging_cell::store::{InMemoryInteractionStore, InteractionStore};
use telephony_cell::models::{CallRecord, SmsRecord, TelephonyError};
use telephony_cell::services::client::TelephonyProvider;

// ==============================================================================
// TEST DOUBLES
// ==============================================================================

struct SilentTelephony;

#[async_trait]
impl TelephonyProvider for SilentTelephony {
    async fn list_calls(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<CallRecord>, TelephonyError> {
        Ok(vec![])
    }

    async fn list_messages(
        &self,
        _to_number: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<SmsRecord>, TelephonyError> {
        Ok(vec![])
    }

    async fn send_sms(&self, _to: &str, _body: &str) -> Result<String, TelephonyError> {
        Ok("sent-1".to_string())
    }
}

/// Calendar store whose every call fails, standing in for a database that
/// is entirely down.
struct DownCalendarStore;

#[async_trait]
impl CalendarStore for DownCalendarStore {
    async fn get_provider(&self, _provider_id: Uuid) -> Result<Provider, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }

    async fn insert_appointment(
        &self,
        _new: NewAppointment,
    ) -> Result<Appointment, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }

    async fn get_appointment(&self, _appointment_id: Uuid) -> Result<Appointment, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }

    async fn find_scheduled_by_code(
        &self,
        _confirmation_code: &str,
    ) -> Result<Option<Appointment>, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }

    async fn is_slot_available(
        &self,
        _provider_id: Uuid,
        _start_time: DateTime<Utc>,
        _duration_minutes: i32,
    ) -> Result<bool, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }

    async fn book_slot(
        &self,
        _provider_id: Uuid,
        _start_time: DateTime<Utc>,
        _appointment_id: Uuid,
        _duration_minutes: i32,
    ) -> Result<BookingOutcome, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }

    async fn update_status(
        &self,
        _appointment_id: Uuid,
        _status: AppointmentStatus,
        _reason: Option<String>,
    ) -> Result<Appointment, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }

    async fn count_appointments_on(&self, _date: NaiveDate) -> Result<i64, CalendarError> {
        Err(CalendarError::Database("connection refused".to_string()))
    }
}

fn app_with(calendar: Arc<dyn CalendarStore>) -> axum::Router {
    let state = Arc::new(MessagingState {
        commands: SmsCommandService::new(
            calendar,
            Arc::new(InMemoryInteractionStore::new()) as Arc<dyn InteractionStore>,
            Arc::new(SilentTelephony) as Arc<dyn TelephonyProvider>,
            "(929) 242-4535".to_string(),
            "gregpedromd.com/booking".to_string(),
        ),
    });
    messaging_routes(state)
}

fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/sms")
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(body.to_string()))
        .expect("request")
}

// ==============================================================================
// TESTS
// ==============================================================================

#[tokio::test]
async fn handled_messages_get_an_empty_200() {
    let app = app_with(Arc::new(InMemoryCalendarStore::new()));

    let response = app
        .oneshot(form_request("From=%2B15551234567&Body=blah+blah"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn missing_fields_still_degrade_to_the_help_path() {
    let app = app_with(Arc::new(InMemoryCalendarStore::new()));

    let response = app.oneshot(form_request("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn a_down_store_answers_500_for_the_provider_to_retry() {
    let app = app_with(Arc::new(DownCalendarStore));

    // The cancel path has to hit the store, which is down.
    let response = app
        .oneshot(form_request("From=%2B15551234567&Body=cancel+AB23CD"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn non_store_paths_survive_a_down_store() {
    let app = app_with(Arc::new(DownCalendarStore));

    // Confirmations never touch the store, so even a dead database does
    // not break them.
    let response = app
        .oneshot(form_request("From=%2B15551234567&Body=y"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// libs/messaging-cell/tests/interpreter_test.rs
//
// End-to-end command interpreter scenarios over the in-memory stores and a
// scripted send port: one inbound body in, one reply out, at most one
// lifecycle transition.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use calendar_cell::models::{AppointmentStatus, NewAppointment, Provider};
use calendar_cell::store::{CalendarStore, InMemoryCalendarStore};
use messaging_cell::models::SmsAction;
use messaging_cell::services::interpreter::SmsCommandService;
use messaging_cell::store::{InMemoryInteractionStore, InteractionStore};
use telephony_cell::models::{CallRecord, SmsRecord, TelephonyError};
use telephony_cell::services::client::TelephonyProvider;

const PRACTICE_PHONE: &str = "(929) 242-4535";
const BOOKING_URL: &str = "gregpedromd.com/booking";

// ==============================================================================
// SCRIPTED SEND PORT
// ==============================================================================

#[derive(Default)]
struct StubTelephony {
    sent: Mutex<Vec<(String, String)>>,
    fail_sends: bool,
}

#[async_trait]
impl TelephonyProvider for StubTelephony {
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

    async fn send_sms(&self, to: &str, body: &str) -> Result<String, TelephonyError> {
        if self.fail_sends {
            return Err(TelephonyError::Provider("send failed".to_string()));
        }
        self.sent
            .lock()
            .expect("sent lock")
            .push((to.to_string(), body.to_string()));
        Ok("sent-1".to_string())
    }
}

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

struct TestSetup {
    store: Arc<InMemoryCalendarStore>,
    interactions: Arc<InMemoryInteractionStore>,
    telephony: Arc<StubTelephony>,
    service: SmsCommandService,
    provider_id: Uuid,
}

impl TestSetup {
    fn new() -> Self {
        Self::with_telephony(StubTelephony::default())
    }

    fn with_telephony(telephony: StubTelephony) -> Self {
        let store = Arc::new(InMemoryCalendarStore::new());
        let interactions = Arc::new(InMemoryInteractionStore::new());
        let telephony = Arc::new(telephony);
        let provider_id = Uuid::new_v4();

        store.add_provider(Provider {
            id: provider_id,
            name: "Dr. Pedro".to_string(),
            slot_duration_minutes: 30,
            working_hours: vec![],
        });

        let service = SmsCommandService::new(
            Arc::clone(&store) as Arc<dyn CalendarStore>,
            Arc::clone(&interactions) as Arc<dyn InteractionStore>,
            Arc::clone(&telephony) as Arc<dyn TelephonyProvider>,
            PRACTICE_PHONE.to_string(),
            BOOKING_URL.to_string(),
        );

        Self {
            store,
            interactions,
            telephony,
            service,
            provider_id,
        }
    }

    /// Seed a scheduled appointment at Jun 5 2026 2:00 PM and return it.
    async fn seed_appointment(&self, patient_phone: &str) -> calendar_cell::models::Appointment {
        self.store
            .insert_appointment(NewAppointment {
                provider_id: self.provider_id,
                patient_name: "Test Patient".to_string(),
                patient_phone: patient_phone.to_string(),
                patient_email: None,
                service_type: "cleaning".to_string(),
                start_time: Utc.with_ymd_and_hms(2026, 6, 5, 14, 0, 0).unwrap(),
                duration_minutes: 30,
                booked_via: Some("web".to_string()),
                notes: None,
            })
            .await
            .expect("seed appointment")
    }
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

#[tokio::test]
async fn cancel_with_matching_code_and_phone_cancels_and_confirms() {
    let setup = TestSetup::new();
    let appointment = setup.seed_appointment("555-123-4567").await;

    let body = format!("cancel {}", appointment.confirmation_code.to_lowercase());
    let reply = setup
        .service
        .handle_inbound("+15551234567", &body)
        .await
        .unwrap();

    assert!(reply.contains("Jun 5, 2026"));
    assert!(reply.contains("2:00 PM"));
    assert!(reply.contains(PRACTICE_PHONE));

    let stored = setup.store.get_appointment(appointment.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
    assert_eq!(
        stored.cancellation_reason.as_deref(),
        Some("Cancelled via SMS")
    );

    let sent = setup.telephony.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+15551234567");

    let interactions = setup.interactions.interactions();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].action_taken, SmsAction::Cancellation);
    assert_eq!(interactions[0].outgoing_message, reply);
}

#[tokio::test]
async fn unknown_code_replies_not_found_without_touching_state() {
    let setup = TestSetup::new();
    let appointment = setup.seed_appointment("555-123-4567").await;

    let reply = setup
        .service
        .handle_inbound("+15551234567", "cancel ZZZZZ9")
        .await
        .unwrap();

    assert!(reply.starts_with("Appointment not found"));
    assert!(reply.contains(PRACTICE_PHONE));

    let stored = setup.store.get_appointment(appointment.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn phone_mismatch_reads_exactly_like_not_found() {
    let setup = TestSetup::new();
    let appointment = setup.seed_appointment("555-123-4567").await;

    let body = format!("cancel {}", appointment.confirmation_code);
    let reply = setup
        .service
        .handle_inbound("+17185550123", &body)
        .await
        .unwrap();

    assert!(reply.starts_with("Appointment not found"));

    let stored = setup.store.get_appointment(appointment.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn already_cancelled_appointments_are_not_reachable_by_code() {
    let setup = TestSetup::new();
    let appointment = setup.seed_appointment("555-123-4567").await;
    setup
        .store
        .update_status(appointment.id, AppointmentStatus::Cancelled, None)
        .await
        .unwrap();

    let body = format!("cancel {}", appointment.confirmation_code);
    let reply = setup
        .service
        .handle_inbound("+15551234567", &body)
        .await
        .unwrap();

    // The scheduled-only lookup misses, so the sender sees not-found.
    assert!(reply.starts_with("Appointment not found"));
}

#[tokio::test]
async fn cancel_family_without_a_code_gets_usage_instructions() {
    let setup = TestSetup::new();

    let reply = setup.service.handle_inbound("+15551234567", "c").await.unwrap();

    assert!(reply.contains("CANCEL [confirmation code]"));
    assert!(reply.contains("CANCEL ABC123"));

    let interactions = setup.interactions.interactions();
    assert_eq!(interactions[0].action_taken, SmsAction::Info);
}

#[tokio::test]
async fn a_failed_reply_send_does_not_undo_the_cancellation() {
    let setup = TestSetup::with_telephony(StubTelephony {
        fail_sends: true,
        ..Default::default()
    });
    let appointment = setup.seed_appointment("555-123-4567").await;

    let body = format!("cancel {}", appointment.confirmation_code);
    let reply = setup
        .service
        .handle_inbound("+15551234567", &body)
        .await
        .unwrap();

    assert!(reply.contains("has been cancelled"));

    let stored = setup.store.get_appointment(appointment.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);

    // The interaction was still logged.
    assert_eq!(setup.interactions.interactions().len(), 1);
}

// ==============================================================================
// OTHER INTENTS
// ==============================================================================

#[tokio::test]
async fn confirm_acknowledges_without_any_lookup() {
    let setup = TestSetup::new();

    let reply = setup.service.handle_inbound("+15551234567", "y").await.unwrap();

    assert_eq!(
        reply,
        "Thank you for confirming your appointment. We look forward to seeing you!"
    );

    let interactions = setup.interactions.interactions();
    assert_eq!(interactions[0].action_taken, SmsAction::Info);
}

#[tokio::test]
async fn reschedule_points_at_the_phone_and_the_booking_page() {
    let setup = TestSetup::new();

    // "r" is the only body shape that reaches the reschedule family; any
    // body containing a "c" is claimed by the cancel family first.
    let reply = setup.service.handle_inbound("+15551234567", "r").await.unwrap();

    assert!(reply.contains(PRACTICE_PHONE));
    assert!(reply.contains(BOOKING_URL));
}

#[tokio::test]
async fn unrecognized_bodies_fall_through_to_help() {
    let setup = TestSetup::new();

    let reply = setup
        .service
        .handle_inbound("+15551234567", "blah blah")
        .await
        .unwrap();

    assert!(reply.contains("CANCEL [code] to cancel"));
    assert!(reply.contains("RESCHEDULE to get rescheduling info"));
    assert!(reply.contains(PRACTICE_PHONE));
}

#[tokio::test]
async fn empty_bodies_degrade_to_help_not_an_error() {
    let setup = TestSetup::new();

    let reply = setup.service.handle_inbound("+15551234567", "   ").await.unwrap();

    assert!(reply.contains("CANCEL [code] to cancel"));
}

#[tokio::test]
async fn every_branch_appends_an_interaction() {
    let setup = TestSetup::new();

    setup.service.handle_inbound("+15551234567", "y").await.unwrap();
    setup.service.handle_inbound("+15551234567", "r").await.unwrap();
    setup
        .service
        .handle_inbound("+15551234567", "blah blah")
        .await
        .unwrap();
    setup
        .service
        .handle_inbound("+15551234567", "cancel ZZZZZ9")
        .await
        .unwrap();

    let interactions = setup.interactions.interactions();
    assert_eq!(interactions.len(), 4);
    assert_eq!(interactions[3].action_taken, SmsAction::Cancellation);
}

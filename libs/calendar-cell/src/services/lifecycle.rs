// libs/calendar-cell/src/services/lifecycle.rs
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, CalendarError};
use crate::store::CalendarStore;

/// Owns the appointment lifecycle rules. Statuses only ever move through
/// here; nothing else writes them.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Get all valid next statuses for a given current status.
    pub fn valid_transitions(&self, current: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
                AppointmentStatus::NoShow,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => vec![],
        }
    }

    /// Validate that a status transition is allowed. A transition to the
    /// current status is always valid (it will be applied as a no-op).
    pub fn validate_transition(
        &self,
        current: AppointmentStatus,
        new: AppointmentStatus,
    ) -> Result<(), CalendarError> {
        if current == new {
            return Ok(());
        }

        if !self.valid_transitions(current).contains(&new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(CalendarError::InvalidTransition {
                from: current,
                to: new,
            });
        }

        Ok(())
    }

    /// Validate and execute one transition. Same-status requests return the
    /// stored row untouched; illegal requests fail before any write.
    pub async fn transition(
        &self,
        store: &dyn CalendarStore,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, CalendarError> {
        let current = store.get_appointment(appointment_id).await?;

        if current.status == new_status {
            debug!(
                "Appointment {} already {}, nothing to do",
                appointment_id, new_status
            );
            return Ok(current);
        }

        self.validate_transition(current.status, new_status)?;

        debug!(
            "Transitioning appointment {} from {} to {}",
            appointment_id, current.status, new_status
        );
        store.update_status(appointment_id, new_status, reason).await
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_can_confirm_cancel_complete_or_no_show() {
        let lifecycle = AppointmentLifecycleService::new();
        let next = lifecycle.valid_transitions(AppointmentStatus::Scheduled);
        assert!(next.contains(&AppointmentStatus::Confirmed));
        assert!(next.contains(&AppointmentStatus::Cancelled));
        assert!(next.contains(&AppointmentStatus::Completed));
        assert!(next.contains(&AppointmentStatus::NoShow));
    }

    #[test]
    fn terminal_states_allow_nothing() {
        let lifecycle = AppointmentLifecycleService::new();
        for status in [
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
            AppointmentStatus::NoShow,
        ] {
            assert!(lifecycle.valid_transitions(status).is_empty());
        }
    }

    #[test]
    fn cancelled_to_confirmed_is_rejected() {
        let lifecycle = AppointmentLifecycleService::new();
        let err = lifecycle
            .validate_transition(AppointmentStatus::Cancelled, AppointmentStatus::Confirmed)
            .unwrap_err();
        assert!(matches!(
            err,
            CalendarError::InvalidTransition {
                from: AppointmentStatus::Cancelled,
                to: AppointmentStatus::Confirmed,
            }
        ));
    }

    #[test]
    fn same_status_is_a_no_op() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_transition(AppointmentStatus::Cancelled, AppointmentStatus::Cancelled)
            .is_ok());
    }
}

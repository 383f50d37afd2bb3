// libs/scheduling-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentStatus, SchedulingError};

/// Status transition rules plus the transition functions that build the
/// next appointment snapshot. `cancelled` is terminal; `confirmed` is set
/// by a separate confirmation flow and is only ever a *current* state here.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled
            | AppointmentStatus::Modified
            | AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Modified,
                AppointmentStatus::Cancelled,
            ],
            // Terminal state
            AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn ensure_modifiable(
        &self,
        current_status: &AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        if !self
            .valid_transitions(current_status)
            .contains(&AppointmentStatus::Modified)
        {
            warn!("Rejected modification of {} appointment", current_status);
            return Err(SchedulingError::InvalidTransition {
                from: *current_status,
            });
        }
        debug!("Status transition {} -> modified allowed", current_status);
        Ok(())
    }

    pub fn ensure_cancellable(
        &self,
        current_status: &AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        if *current_status == AppointmentStatus::Cancelled {
            warn!("Rejected cancellation of already cancelled appointment");
            return Err(SchedulingError::AlreadyCancelled);
        }
        debug!("Status transition {} -> cancelled allowed", current_status);
        Ok(())
    }

    /// Build the modified snapshot. Caller must have passed
    /// `ensure_modifiable` for the current status.
    pub fn apply_modification(
        &self,
        appointment: &Appointment,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        reason: Option<String>,
        request_token: &str,
    ) -> Appointment {
        let mut updated = appointment.clone();
        updated.start_time = start_time;
        updated.end_time = end_time;
        updated.status = AppointmentStatus::Modified;
        if let Some(reason) = reason {
            updated.reason = Some(reason);
        }
        updated.request_token = request_token.to_string();
        updated.updated_at = Utc::now();
        updated
    }

    /// Build the cancelled snapshot. The cancellation reason is appended to
    /// the existing reason rather than replacing it.
    pub fn apply_cancellation(
        &self,
        appointment: &Appointment,
        cancellation_reason: Option<&str>,
        request_token: &str,
    ) -> Appointment {
        let mut cancelled = appointment.clone();
        cancelled.status = AppointmentStatus::Cancelled;
        cancelled.reason =
            Self::annotate_cancellation(appointment.reason.as_deref(), cancellation_reason);
        cancelled.request_token = request_token.to_string();
        cancelled.updated_at = Utc::now();
        cancelled
    }

    fn annotate_cancellation(
        existing: Option<&str>,
        cancellation: Option<&str>,
    ) -> Option<String> {
        match (existing, cancellation) {
            (Some(existing), Some(new_reason)) => {
                Some(format!("{} | Cancellation: {}", existing, new_reason))
            }
            (None, Some(new_reason)) => Some(format!("Cancellation: {}", new_reason)),
            (existing, None) => existing.map(str::to_owned),
        }
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
    use chrono::TimeZone;
    use uuid::Uuid;

    fn sample_appointment(status: AppointmentStatus) -> Appointment {
        let start = Utc.with_ymd_and_hms(2030, 6, 3, 9, 0, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            status,
            reason: Some("Checkup".to_string()),
            request_token: "token-original".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn active_statuses_can_be_modified_and_cancelled() {
        let lifecycle = AppointmentLifecycleService::new();
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Modified,
            AppointmentStatus::Confirmed,
        ] {
            assert!(lifecycle.ensure_modifiable(&status).is_ok());
            assert!(lifecycle.ensure_cancellable(&status).is_ok());
        }
    }

    #[test]
    fn cancelled_is_terminal() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .valid_transitions(&AppointmentStatus::Cancelled)
            .is_empty());
        assert!(matches!(
            lifecycle.ensure_modifiable(&AppointmentStatus::Cancelled),
            Err(SchedulingError::InvalidTransition {
                from: AppointmentStatus::Cancelled
            })
        ));
        assert!(matches!(
            lifecycle.ensure_cancellable(&AppointmentStatus::Cancelled),
            Err(SchedulingError::AlreadyCancelled)
        ));
    }

    #[test]
    fn modification_replaces_interval_and_token() {
        let lifecycle = AppointmentLifecycleService::new();
        let appointment = sample_appointment(AppointmentStatus::Scheduled);
        let new_start = Utc.with_ymd_and_hms(2030, 6, 4, 10, 0, 0).unwrap();
        let new_end = new_start + chrono::Duration::minutes(45);

        let updated = lifecycle.apply_modification(
            &appointment,
            new_start,
            new_end,
            Some("Follow-up".to_string()),
            "token-modify",
        );

        assert_eq!(updated.id, appointment.id);
        assert_eq!(updated.start_time, new_start);
        assert_eq!(updated.end_time, new_end);
        assert_eq!(updated.status, AppointmentStatus::Modified);
        assert_eq!(updated.reason.as_deref(), Some("Follow-up"));
        assert_eq!(updated.request_token, "token-modify");
        assert!(updated.updated_at > appointment.updated_at);
        assert_eq!(updated.created_at, appointment.created_at);
    }

    #[test]
    fn modification_without_reason_keeps_existing_reason() {
        let lifecycle = AppointmentLifecycleService::new();
        let appointment = sample_appointment(AppointmentStatus::Scheduled);

        let updated = lifecycle.apply_modification(
            &appointment,
            appointment.start_time,
            appointment.end_time,
            None,
            "token-modify",
        );

        assert_eq!(updated.reason.as_deref(), Some("Checkup"));
    }

    #[test]
    fn cancellation_appends_reason() {
        let lifecycle = AppointmentLifecycleService::new();
        let appointment = sample_appointment(AppointmentStatus::Confirmed);

        let cancelled =
            lifecycle.apply_cancellation(&appointment, Some("Patient unavailable"), "token-cancel");

        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(
            cancelled.reason.as_deref(),
            Some("Checkup | Cancellation: Patient unavailable")
        );
        assert_eq!(cancelled.request_token, "token-cancel");
    }

    #[test]
    fn cancellation_without_prior_reason_stands_alone() {
        let lifecycle = AppointmentLifecycleService::new();
        let mut appointment = sample_appointment(AppointmentStatus::Scheduled);
        appointment.reason = None;

        let cancelled = lifecycle.apply_cancellation(&appointment, Some("No show"), "token-cancel");

        assert_eq!(cancelled.reason.as_deref(), Some("Cancellation: No show"));
    }

    #[test]
    fn cancellation_without_reason_keeps_existing() {
        let lifecycle = AppointmentLifecycleService::new();
        let appointment = sample_appointment(AppointmentStatus::Scheduled);

        let cancelled = lifecycle.apply_cancellation(&appointment, None, "token-cancel");

        assert_eq!(cancelled.reason.as_deref(), Some("Checkup"));
    }
}

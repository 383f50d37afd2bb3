use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentEventKind {
    AppointmentScheduled,
    AppointmentModified,
    AppointmentCancelled,
}

impl AppointmentEventKind {
    /// Channel the event is published on. Consumers subscribe with the
    /// `appointments.*` pattern to receive every kind.
    pub fn routing_key(&self) -> &'static str {
        match self {
            AppointmentEventKind::AppointmentScheduled => "appointments.appointment-scheduled",
            AppointmentEventKind::AppointmentModified => "appointments.appointment-modified",
            AppointmentEventKind::AppointmentCancelled => "appointments.appointment-cancelled",
        }
    }
}

impl fmt::Display for AppointmentEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentEventKind::AppointmentScheduled => write!(f, "appointment_scheduled"),
            AppointmentEventKind::AppointmentModified => write!(f, "appointment_modified"),
            AppointmentEventKind::AppointmentCancelled => write!(f, "appointment_cancelled"),
        }
    }
}

/// Snapshot of an appointment at the moment a mutation committed.
/// Published as JSON; delivery is best-effort so consumers must tolerate
/// duplicates and gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentEvent {
    pub kind: AppointmentEventKind,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
    pub reason: Option<String>,
    pub request_token: String,
    pub emitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn routing_keys_share_the_appointments_prefix() {
        let kinds = [
            AppointmentEventKind::AppointmentScheduled,
            AppointmentEventKind::AppointmentModified,
            AppointmentEventKind::AppointmentCancelled,
        ];

        for kind in kinds {
            assert!(kind.routing_key().starts_with("appointments."));
        }
        assert_eq!(
            AppointmentEventKind::AppointmentCancelled.routing_key(),
            "appointments.appointment-cancelled"
        );
    }

    #[test]
    fn event_serializes_with_snake_case_keys() {
        let event = AppointmentEvent {
            kind: AppointmentEventKind::AppointmentScheduled,
            appointment_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            start: Utc::now(),
            end: Utc::now(),
            status: "scheduled".to_string(),
            reason: None,
            request_token: "tok-1".to_string(),
            emitted_at: Utc::now(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], json!("appointment_scheduled"));
        assert_eq!(value["status"], json!("scheduled"));
        assert!(value.get("appointment_id").is_some());
        assert!(value.get("request_token").is_some());
    }
}

// libs/scheduling-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

use shared_config::AppConfig;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub request_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Modified,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    /// Active appointments occupy their time slot for conflict purposes.
    /// Cancelled is the only status that frees the interval.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled
                | AppointmentStatus::Modified
                | AppointmentStatus::Confirmed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Modified => write!(f, "modified"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Which side of the appointment a conflict was found on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Patient,
    Provider,
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyRole::Patient => write!(f, "patient"),
            PartyRole::Provider => write!(f, "provider"),
        }
    }
}

/// Insert shape. The store assigns id, created_at and updated_at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub request_token: String,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAppointmentRequest {
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<String>,
    pub request_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyAppointmentRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub request_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
    pub request_token: String,
}

// ==============================================================================
// SCHEDULING POLICY
// ==============================================================================

/// Business-hours window for appointment intervals. Bounds are compared at
/// hour granularity: with an 18:00 close, an end at 18:59 passes and 19:00
/// is rejected.
#[derive(Debug, Clone, Copy)]
pub struct SchedulingPolicy {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            open_hour: 8,
            close_hour: 18,
        }
    }
}

impl SchedulingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            open_hour: config.business_open_hour,
            close_hour: config.business_close_hour,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid appointment request: {0}")]
    Validation(String),

    #[error("{party} {party_id} already has an appointment overlapping {start_time} to {end_time}")]
    Conflict {
        party: PartyRole,
        party_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment cannot be modified in current status: {from}")]
    InvalidTransition { from: AppointmentStatus },

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Repository error: {0}")]
    Repository(String),
}

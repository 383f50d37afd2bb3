// libs/scheduling-cell/src/repository/mod.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Appointment, NewAppointment, PartyRole, SchedulingError};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAppointmentRepository;
pub use supabase::SupabaseAppointmentRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store already holds an appointment created under this token.
    #[error("Request token already consumed")]
    DuplicateRequestToken,

    /// The write would leave two active appointments overlapping for the
    /// same patient or provider.
    #[error("Write would overlap an active appointment")]
    ActiveOverlap,

    #[error("Store error: {0}")]
    Store(String),
}

impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        SchedulingError::Repository(err.to_string())
    }
}

/// Durable store for appointments. Implementations must reject
/// `DuplicateRequestToken` and `ActiveOverlap` at write time, atomically
/// with the write itself; the mutation pipeline leans on that as the
/// backstop for its check-then-act sequence.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_request_token(
        &self,
        request_token: &str,
    ) -> Result<Option<Appointment>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, RepositoryError>;

    /// Count active appointments for the party whose `[start_time, end_time)`
    /// interval overlaps the candidate, skipping `exclude_appointment_id`
    /// when given.
    async fn count_active_overlapping(
        &self,
        party: PartyRole,
        party_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<i64, RepositoryError>;

    /// Insert, assigning id and timestamps.
    async fn create(&self, appointment: NewAppointment) -> Result<Appointment, RepositoryError>;

    /// Persist a new snapshot of an existing appointment.
    async fn update(&self, appointment: &Appointment) -> Result<Appointment, RepositoryError>;

    /// Active appointments for the patient, ascending by start time.
    async fn list_active_by_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, RepositoryError>;

    /// Active appointments for the provider, ascending by start time.
    async fn list_active_by_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Appointment>, RepositoryError>;
}

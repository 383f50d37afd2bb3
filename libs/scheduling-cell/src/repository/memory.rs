// libs/scheduling-cell/src/repository/memory.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AppointmentRepository, RepositoryError};
use crate::models::{Appointment, NewAppointment, PartyRole};
use crate::services::conflict::intervals_overlap;

/// In-memory appointment store. A single mutex spans every read-check-write
/// sequence, so the token uniqueness and active-overlap rejections are as
/// atomic as the database constraints they stand in for.
#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: Mutex<Vec<Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing the write constraints.
    pub async fn insert_raw(&self, appointment: Appointment) {
        self.appointments.lock().await.push(appointment);
    }

    fn overlaps_active(
        appointments: &[Appointment],
        patient_id: Uuid,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> bool {
        appointments.iter().any(|existing| {
            existing.status.is_active()
                && Some(existing.id) != exclude_id
                && (existing.patient_id == patient_id || existing.provider_id == provider_id)
                && intervals_overlap(
                    existing.start_time,
                    existing.end_time,
                    start_time,
                    end_time,
                )
        })
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn find_by_request_token(
        &self,
        request_token: &str,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments
            .iter()
            .find(|a| a.request_token == request_token)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, RepositoryError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn count_active_overlapping(
        &self,
        party: PartyRole,
        party_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<i64, RepositoryError> {
        let appointments = self.appointments.lock().await;
        let count = appointments
            .iter()
            .filter(|existing| {
                let party_matches = match party {
                    PartyRole::Patient => existing.patient_id == party_id,
                    PartyRole::Provider => existing.provider_id == party_id,
                };
                party_matches
                    && existing.status.is_active()
                    && Some(existing.id) != exclude_appointment_id
                    && intervals_overlap(
                        existing.start_time,
                        existing.end_time,
                        start_time,
                        end_time,
                    )
            })
            .count();
        Ok(count as i64)
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment, RepositoryError> {
        let mut appointments = self.appointments.lock().await;

        if appointments
            .iter()
            .any(|a| a.request_token == appointment.request_token)
        {
            return Err(RepositoryError::DuplicateRequestToken);
        }
        if appointment.status.is_active()
            && Self::overlaps_active(
                &appointments,
                appointment.patient_id,
                appointment.provider_id,
                appointment.start_time,
                appointment.end_time,
                None,
            )
        {
            return Err(RepositoryError::ActiveOverlap);
        }

        let now = Utc::now();
        let created = Appointment {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            provider_id: appointment.provider_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: appointment.status,
            reason: appointment.reason,
            request_token: appointment.request_token,
            created_at: now,
            updated_at: now,
        };
        appointments.push(created.clone());
        Ok(created)
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment, RepositoryError> {
        let mut appointments = self.appointments.lock().await;

        let index = appointments
            .iter()
            .position(|a| a.id == appointment.id)
            .ok_or_else(|| {
                RepositoryError::Store(format!("Appointment {} not found for update", appointment.id))
            })?;

        if appointments
            .iter()
            .any(|a| a.id != appointment.id && a.request_token == appointment.request_token)
        {
            return Err(RepositoryError::DuplicateRequestToken);
        }
        if appointment.status.is_active()
            && Self::overlaps_active(
                &appointments,
                appointment.patient_id,
                appointment.provider_id,
                appointment.start_time,
                appointment.end_time,
                Some(appointment.id),
            )
        {
            return Err(RepositoryError::ActiveOverlap);
        }

        appointments[index] = appointment.clone();
        Ok(appointment.clone())
    }

    async fn list_active_by_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let appointments = self.appointments.lock().await;
        let mut active: Vec<Appointment> = appointments
            .iter()
            .filter(|a| a.patient_id == patient_id && a.status.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|a| a.start_time);
        Ok(active)
    }

    async fn list_active_by_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let appointments = self.appointments.lock().await;
        let mut active: Vec<Appointment> = appointments
            .iter()
            .filter(|a| a.provider_id == provider_id && a.status.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|a| a.start_time);
        Ok(active)
    }
}

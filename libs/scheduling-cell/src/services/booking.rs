// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, Timelike, Utc};
use event_bus_cell::{
    AppointmentEvent, AppointmentEventKind, DomainEventPublisher, RedisEventPublisher,
};
use shared_config::AppConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, CancelAppointmentRequest, ModifyAppointmentRequest,
    NewAppointment, PartyRole, ScheduleAppointmentRequest, SchedulingError, SchedulingPolicy,
};
use crate::repository::{AppointmentRepository, RepositoryError, SupabaseAppointmentRepository};
use crate::services::conflict::ConflictDetectionService;
use crate::services::idempotency::IdempotencyGuard;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Orchestrates the appointment mutations. Every mutation runs the same
/// pipeline shape: idempotency guard, validation, conflict detection,
/// persist, then a best-effort domain event.
pub struct AppointmentBookingService {
    repository: Arc<dyn AppointmentRepository>,
    events: Arc<dyn DomainEventPublisher>,
    idempotency: IdempotencyGuard,
    conflicts: ConflictDetectionService,
    lifecycle: AppointmentLifecycleService,
    policy: SchedulingPolicy,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let repository: Arc<dyn AppointmentRepository> =
            Arc::new(SupabaseAppointmentRepository::new(config));
        let events: Arc<dyn DomainEventPublisher> = Arc::new(RedisEventPublisher::new(config));
        Self::with_components(repository, events, SchedulingPolicy::from_config(config))
    }

    /// Wire the service against explicit components. Tests use this with the
    /// in-memory repository and a recording publisher.
    pub fn with_components(
        repository: Arc<dyn AppointmentRepository>,
        events: Arc<dyn DomainEventPublisher>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            idempotency: IdempotencyGuard::new(Arc::clone(&repository)),
            conflicts: ConflictDetectionService::new(Arc::clone(&repository)),
            lifecycle: AppointmentLifecycleService::new(),
            repository,
            events,
            policy,
        }
    }

    pub async fn schedule_appointment(
        &self,
        request: ScheduleAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Scheduling appointment for patient {} with provider {}",
            request.patient_id, request.provider_id
        );

        // **Step 1: Idempotency guard**
        if let Some(prior) = self.idempotency.resolve(&request.request_token).await? {
            return Ok(prior);
        }

        // **Step 2: Validate the requested interval**
        self.validate_interval(request.start_time, request.end_time)?;

        // **Step 3: Conflict detection for both parties**
        self.conflicts
            .ensure_parties_available(
                request.provider_id,
                request.patient_id,
                request.start_time,
                request.end_time,
                None,
            )
            .await?;

        // **Step 4: Persist the appointment**
        let new_appointment = NewAppointment {
            patient_id: request.patient_id,
            provider_id: request.provider_id,
            start_time: request.start_time,
            end_time: request.end_time,
            status: AppointmentStatus::Scheduled,
            reason: request.reason.clone(),
            request_token: request.request_token.clone(),
        };

        let appointment = match self.repository.create(new_appointment).await {
            Ok(appointment) => appointment,
            Err(e) => return self.recover_create_race(e, &request).await,
        };

        // **Step 5: Emit the domain event**
        self.emit(AppointmentEventKind::AppointmentScheduled, &appointment)
            .await;

        info!("Appointment {} scheduled successfully", appointment.id);
        Ok(appointment)
    }

    pub async fn modify_appointment(
        &self,
        appointment_id: Uuid,
        request: ModifyAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!("Modifying appointment {}", appointment_id);

        // **Step 1: Idempotency guard**
        if let Some(prior) = self.idempotency.resolve(&request.request_token).await? {
            return Ok(prior);
        }

        // **Step 2: Load the current state**
        let current = self
            .repository
            .find_by_id(appointment_id)
            .await?
            .ok_or(SchedulingError::NotFound)?;

        // **Step 3: Lifecycle check**
        self.lifecycle.ensure_modifiable(&current.status)?;

        // **Step 4: Resolve and validate the effective interval**
        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        self.validate_interval(start_time, end_time)?;

        // **Step 5: Conflict detection, ignoring this appointment's own slot**
        let interval_changed =
            start_time != current.start_time || end_time != current.end_time;
        if interval_changed {
            self.conflicts
                .ensure_parties_available(
                    current.provider_id,
                    current.patient_id,
                    start_time,
                    end_time,
                    Some(current.id),
                )
                .await?;
        }

        // **Step 6: Apply the transition and persist**
        let updated = self.lifecycle.apply_modification(
            &current,
            start_time,
            end_time,
            request.reason.clone(),
            &request.request_token,
        );
        let appointment = match self.repository.update(&updated).await {
            Ok(appointment) => appointment,
            Err(e) => return self.recover_update_race(e, &updated).await,
        };

        // **Step 7: Emit the domain event**
        self.emit(AppointmentEventKind::AppointmentModified, &appointment)
            .await;

        info!("Appointment {} modified successfully", appointment.id);
        Ok(appointment)
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!("Cancelling appointment {}", appointment_id);

        // **Step 1: Idempotency guard**
        if let Some(prior) = self.idempotency.resolve(&request.request_token).await? {
            return Ok(prior);
        }

        // **Step 2: Load the current state**
        let current = self
            .repository
            .find_by_id(appointment_id)
            .await?
            .ok_or(SchedulingError::NotFound)?;

        // **Step 3: Lifecycle check**
        self.lifecycle.ensure_cancellable(&current.status)?;

        // **Step 4: Apply the transition and persist**
        let cancelled = self.lifecycle.apply_cancellation(
            &current,
            request.reason.as_deref(),
            &request.request_token,
        );
        let appointment = match self.repository.update(&cancelled).await {
            Ok(appointment) => appointment,
            Err(e) => return self.recover_update_race(e, &cancelled).await,
        };

        // **Step 5: Emit the domain event**
        self.emit(AppointmentEventKind::AppointmentCancelled, &appointment)
            .await;

        info!("Appointment {} cancelled successfully", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Fetching appointment {}", appointment_id);
        self.repository
            .find_by_id(appointment_id)
            .await?
            .ok_or(SchedulingError::NotFound)
    }

    pub async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        debug!("Listing active appointments for patient {}", patient_id);
        Ok(self.repository.list_active_by_patient(patient_id).await?)
    }

    pub async fn list_provider_appointments(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        debug!("Listing active appointments for provider {}", provider_id);
        Ok(self.repository.list_active_by_provider(provider_id).await?)
    }

    fn validate_interval(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        if start_time >= end_time {
            return Err(SchedulingError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }

        if start_time <= Utc::now() {
            return Err(SchedulingError::Validation(
                "Appointment must start in the future".to_string(),
            ));
        }

        // Hour-granularity business hours: an end at 18:59 passes an 18:00
        // close, an end at 19:00 does not.
        if start_time.hour() < self.policy.open_hour || end_time.hour() > self.policy.close_hour {
            return Err(SchedulingError::Validation(format!(
                "Appointments must fall between {}:00 and {}:00",
                self.policy.open_hour, self.policy.close_hour
            )));
        }

        Ok(())
    }

    /// A create rejected by the store means we lost a race: a duplicate
    /// token means a concurrent call with the same token already created
    /// the appointment, so return that one without emitting a second event.
    /// An overlap means another booking took the slot after our conflict
    /// check passed, so re-run the check to name the busy party.
    async fn recover_create_race(
        &self,
        err: RepositoryError,
        request: &ScheduleAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        match err {
            RepositoryError::DuplicateRequestToken => {
                debug!("Request token raced a concurrent schedule, replaying the winner");
                match self
                    .repository
                    .find_by_request_token(&request.request_token)
                    .await?
                {
                    Some(appointment) => Ok(appointment),
                    None => Err(SchedulingError::Repository(
                        "Request token vanished after duplicate rejection".to_string(),
                    )),
                }
            }
            RepositoryError::ActiveOverlap => {
                self.conflicts
                    .ensure_parties_available(
                        request.provider_id,
                        request.patient_id,
                        request.start_time,
                        request.end_time,
                        None,
                    )
                    .await?;
                // The conflicting row can be gone again by the time we
                // re-check; the store still rejected the write.
                Err(SchedulingError::Conflict {
                    party: PartyRole::Provider,
                    party_id: request.provider_id,
                    start_time: request.start_time,
                    end_time: request.end_time,
                })
            }
            other => Err(other.into()),
        }
    }

    async fn recover_update_race(
        &self,
        err: RepositoryError,
        attempted: &Appointment,
    ) -> Result<Appointment, SchedulingError> {
        match err {
            RepositoryError::DuplicateRequestToken => {
                debug!("Request token raced a concurrent mutation, replaying the winner");
                match self
                    .repository
                    .find_by_request_token(&attempted.request_token)
                    .await?
                {
                    Some(appointment) => Ok(appointment),
                    None => Err(SchedulingError::Repository(
                        "Request token vanished after duplicate rejection".to_string(),
                    )),
                }
            }
            RepositoryError::ActiveOverlap => {
                self.conflicts
                    .ensure_parties_available(
                        attempted.provider_id,
                        attempted.patient_id,
                        attempted.start_time,
                        attempted.end_time,
                        Some(attempted.id),
                    )
                    .await?;
                Err(SchedulingError::Conflict {
                    party: PartyRole::Provider,
                    party_id: attempted.provider_id,
                    start_time: attempted.start_time,
                    end_time: attempted.end_time,
                })
            }
            other => Err(other.into()),
        }
    }

    /// Emission is best effort: the mutation is already committed, so a
    /// publish failure is logged and swallowed.
    async fn emit(&self, kind: AppointmentEventKind, appointment: &Appointment) {
        let event = AppointmentEvent {
            kind,
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            provider_id: appointment.provider_id,
            start: appointment.start_time,
            end: appointment.end_time,
            status: appointment.status.to_string(),
            reason: appointment.reason.clone(),
            request_token: appointment.request_token.clone(),
            emitted_at: Utc::now(),
        };

        if let Err(e) = self.events.publish(&event).await {
            warn!(
                "Failed to publish {} event for appointment {}: {}",
                kind, appointment.id, e
            );
        }
    }
}

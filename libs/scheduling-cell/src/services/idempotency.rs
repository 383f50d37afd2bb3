// libs/scheduling-cell/src/services/idempotency.rs
use std::sync::Arc;
use tracing::info;

use crate::models::{Appointment, SchedulingError};
use crate::repository::AppointmentRepository;

/// First stop of every mutation: a blank token is a validation error, a
/// token already consumed returns the stored appointment so retries see
/// the first outcome, and a fresh token lets the pipeline proceed.
pub struct IdempotencyGuard {
    repository: Arc<dyn AppointmentRepository>,
}

impl IdempotencyGuard {
    pub fn new(repository: Arc<dyn AppointmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn resolve(
        &self,
        request_token: &str,
    ) -> Result<Option<Appointment>, SchedulingError> {
        if request_token.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "request_token must not be blank".to_string(),
            ));
        }

        let prior = self.repository.find_by_request_token(request_token).await?;

        if let Some(appointment) = &prior {
            info!(
                "Request token already consumed by appointment {}, replaying stored result",
                appointment.id
            );
        }

        Ok(prior)
    }
}

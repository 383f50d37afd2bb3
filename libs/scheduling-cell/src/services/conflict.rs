// libs/scheduling-cell/src/services/conflict.rs
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{PartyRole, SchedulingError};
use crate::repository::AppointmentRepository;

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`
/// overlap exactly when each starts before the other ends. Intervals that
/// only touch at an endpoint do not overlap, so back-to-back appointments
/// are allowed.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub struct ConflictDetectionService {
    repository: Arc<dyn AppointmentRepository>,
}

impl ConflictDetectionService {
    pub fn new(repository: Arc<dyn AppointmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn has_conflict(
        &self,
        party: PartyRole,
        party_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, SchedulingError> {
        debug!(
            "Checking {} {} for conflicts between {} and {}",
            party, party_id, start_time, end_time
        );

        let count = self
            .repository
            .count_active_overlapping(party, party_id, start_time, end_time, exclude_appointment_id)
            .await?;

        Ok(count > 0)
    }

    /// Check the provider first, then the patient; the first party found
    /// busy names the conflict.
    pub async fn ensure_parties_available(
        &self,
        provider_id: Uuid,
        patient_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        if self
            .has_conflict(
                PartyRole::Provider,
                provider_id,
                start_time,
                end_time,
                exclude_appointment_id,
            )
            .await?
        {
            warn!(
                "Provider {} already booked between {} and {}",
                provider_id, start_time, end_time
            );
            return Err(SchedulingError::Conflict {
                party: PartyRole::Provider,
                party_id: provider_id,
                start_time,
                end_time,
            });
        }

        if self
            .has_conflict(
                PartyRole::Patient,
                patient_id,
                start_time,
                end_time,
                exclude_appointment_id,
            )
            .await?
        {
            warn!(
                "Patient {} already booked between {} and {}",
                patient_id, start_time, end_time
            );
            return Err(SchedulingError::Conflict {
                party: PartyRole::Patient,
                party_id: patient_id,
                start_time,
                end_time,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 3, hour, min, 0).unwrap()
    }

    #[test]
    fn overlapping_intervals_are_detected() {
        assert!(intervals_overlap(at(9, 0), at(10, 0), at(9, 30), at(10, 30)));
        assert!(intervals_overlap(at(9, 30), at(10, 30), at(9, 0), at(10, 0)));
    }

    #[test]
    fn containment_counts_as_overlap() {
        assert!(intervals_overlap(at(9, 0), at(12, 0), at(10, 0), at(11, 0)));
        assert!(intervals_overlap(at(10, 0), at(11, 0), at(9, 0), at(12, 0)));
    }

    #[test]
    fn identical_intervals_overlap() {
        assert!(intervals_overlap(at(9, 0), at(10, 0), at(9, 0), at(10, 0)));
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        assert!(!intervals_overlap(at(9, 0), at(10, 0), at(10, 0), at(11, 0)));
        assert!(!intervals_overlap(at(10, 0), at(11, 0), at(9, 0), at(10, 0)));
    }

    #[test]
    fn disjoint_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(9, 0), at(10, 0), at(14, 0), at(15, 0)));
    }
}

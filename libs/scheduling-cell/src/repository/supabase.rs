// libs/scheduling-cell/src/repository/supabase.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use shared_config::AppConfig;
use shared_database::{SupabaseApiError, SupabaseClient};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{AppointmentRepository, RepositoryError};
use crate::models::{Appointment, NewAppointment, PartyRole};

const APPOINTMENTS_TABLE: &str = "/rest/v1/appointments";
const ACTIVE_STATUS_FILTER: &str = "status=in.(scheduled,modified,confirmed)";

/// PostgREST-backed appointment store. Uniqueness of the request token and
/// non-overlap of active intervals are enforced by the database (a unique
/// index and an exclusion constraint); constraint violations surface here
/// as typed errors via the SQLSTATE in the 409 body.
pub struct SupabaseAppointmentRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn map_read_error(e: anyhow::Error) -> RepositoryError {
        RepositoryError::Store(e.to_string())
    }

    fn map_write_error(e: anyhow::Error) -> RepositoryError {
        if let Some(api_error) = e.downcast_ref::<SupabaseApiError>() {
            if api_error.is_conflict() {
                return match api_error.sqlstate().as_deref() {
                    // unique_violation on the request token index
                    Some("23505") => RepositoryError::DuplicateRequestToken,
                    // exclusion_violation on the active interval constraint
                    Some("23P01") => RepositoryError::ActiveOverlap,
                    _ => RepositoryError::Store(api_error.to_string()),
                };
            }
        }
        RepositoryError::Store(e.to_string())
    }

    fn parse_row(row: Value) -> Result<Appointment, RepositoryError> {
        serde_json::from_value(row)
            .map_err(|e| RepositoryError::Store(format!("Failed to parse appointment row: {}", e)))
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, RepositoryError> {
        rows.into_iter().map(Self::parse_row).collect()
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn find_by_request_token(
        &self,
        request_token: &str,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let path = format!(
            "{}?request_token=eq.{}&limit=1",
            APPOINTMENTS_TABLE,
            urlencoding::encode(request_token)
        );

        let response: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_read_error)?;

        match response.into_iter().next() {
            Some(row) => Ok(Some(Self::parse_row(row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, RepositoryError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS_TABLE, id);

        let response: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_read_error)?;

        match response.into_iter().next() {
            Some(row) => Ok(Some(Self::parse_row(row)?)),
            None => Ok(None),
        }
    }

    async fn count_active_overlapping(
        &self,
        party: PartyRole,
        party_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<i64, RepositoryError> {
        let party_column = match party {
            PartyRole::Patient => "patient_id",
            PartyRole::Provider => "provider_id",
        };

        // Half-open overlap: an existing row collides when it starts before
        // the candidate ends and ends after the candidate starts.
        let mut path = format!(
            "{}?select=id&{}=eq.{}&{}&start_time=lt.{}&end_time=gt.{}",
            APPOINTMENTS_TABLE,
            party_column,
            party_id,
            ACTIVE_STATUS_FILTER,
            urlencoding::encode(&end_time.to_rfc3339()),
            urlencoding::encode(&start_time.to_rfc3339()),
        );
        if let Some(exclude_id) = exclude_appointment_id {
            path.push_str(&format!("&id=neq.{}", exclude_id));
        }

        let response: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_read_error)?;

        debug!(
            "Found {} overlapping active appointments for {} {}",
            response.len(),
            party,
            party_id
        );

        Ok(response.len() as i64)
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment, RepositoryError> {
        let now = Utc::now();
        let appointment_data = json!({
            "patient_id": appointment.patient_id,
            "provider_id": appointment.provider_id,
            "start_time": appointment.start_time.to_rfc3339(),
            "end_time": appointment.end_time.to_rfc3339(),
            "status": appointment.status.to_string(),
            "reason": appointment.reason,
            "request_token": appointment.request_token,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let response: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                APPOINTMENTS_TABLE,
                Some(appointment_data),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(Self::map_write_error)?;

        match response.into_iter().next() {
            Some(row) => Self::parse_row(row),
            None => Err(RepositoryError::Store(
                "Insert returned no representation".to_string(),
            )),
        }
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment, RepositoryError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS_TABLE, appointment.id);
        let update_data = json!({
            "start_time": appointment.start_time.to_rfc3339(),
            "end_time": appointment.end_time.to_rfc3339(),
            "status": appointment.status.to_string(),
            "reason": appointment.reason,
            "request_token": appointment.request_token,
            "updated_at": appointment.updated_at.to_rfc3339(),
        });

        let response: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(update_data),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(Self::map_write_error)?;

        match response.into_iter().next() {
            Some(row) => Self::parse_row(row),
            None => Err(RepositoryError::Store(format!(
                "Appointment {} not found for update",
                appointment.id
            ))),
        }
    }

    async fn list_active_by_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let path = format!(
            "{}?patient_id=eq.{}&{}&order=start_time.asc",
            APPOINTMENTS_TABLE, patient_id, ACTIVE_STATUS_FILTER
        );

        let response: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_read_error)?;

        Self::parse_rows(response)
    }

    async fn list_active_by_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let path = format!(
            "{}?provider_id=eq.{}&{}&order=start_time.asc",
            APPOINTMENTS_TABLE, provider_id, ACTIVE_STATUS_FILTER
        );

        let response: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_read_error)?;

        Self::parse_rows(response)
    }
}

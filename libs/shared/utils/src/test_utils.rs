use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub redis_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            redis_url: self.redis_url.clone(),
            business_open_hour: 8,
            business_close_hour: 18,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// One appointment row as PostgREST returns it.
    pub fn appointment_row(
        id: Uuid,
        patient_id: Uuid,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        status: &str,
        request_token: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "provider_id": provider_id,
            "start_time": start_time.to_rfc3339(),
            "end_time": end_time.to_rfc3339(),
            "status": status,
            "reason": null,
            "request_token": request_token,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    /// PostgREST error body; `code` is the Postgres SQLSTATE.
    pub fn error_response(code: &str, message: &str) -> serde_json::Value {
        json!({
            "code": code,
            "details": null,
            "hint": null,
            "message": message
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_service_key, "test-service-key");
        assert_eq!(app_config.business_open_hour, 8);
        assert_eq!(app_config.business_close_hour, 18);
    }

    #[test]
    fn appointment_row_round_trips_ids() {
        let id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let provider_id = Uuid::new_v4();
        let start = Utc::now();
        let end = start + chrono::Duration::hours(1);

        let row = MockSupabaseResponses::appointment_row(
            id, patient_id, provider_id, start, end, "scheduled", "tok-1",
        );

        assert_eq!(row["id"], json!(id));
        assert_eq!(row["patient_id"], json!(patient_id));
        assert_eq!(row["status"], "scheduled");
        assert_eq!(row["request_token"], "tok-1");
    }
}

// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Appointment mutations
        .route("/", post(handlers::schedule_appointment))
        .route("/{appointment_id}", put(handlers::modify_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        // Appointment reads
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/providers/{provider_id}", get(handlers::get_provider_appointments))
        .with_state(state)
}

// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    CancelAppointmentRequest, ModifyAppointmentRequest, ScheduleAppointmentRequest,
    SchedulingError,
};
use crate::services::booking::AppointmentBookingService;

// ==============================================================================
// APPOINTMENT MUTATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn schedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<ScheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .schedule_appointment(request)
        .await
        .map_err(|e| match e {
            SchedulingError::Validation(msg) => AppError::BadRequest(msg),
            SchedulingError::Conflict { .. } => AppError::Conflict(e.to_string()),
            SchedulingError::Repository(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment scheduled successfully"
    })))
}

#[axum::debug_handler]
pub async fn modify_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<ModifyAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .modify_appointment(appointment_id, request)
        .await
        .map_err(|e| match e {
            SchedulingError::NotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            SchedulingError::Validation(msg) => AppError::BadRequest(msg),
            SchedulingError::Conflict { .. } => AppError::Conflict(e.to_string()),
            SchedulingError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
            SchedulingError::Repository(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment modified successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .cancel_appointment(appointment_id, request)
        .await
        .map_err(|e| match e {
            SchedulingError::NotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            SchedulingError::Validation(msg) => AppError::BadRequest(msg),
            SchedulingError::AlreadyCancelled => AppError::Conflict(e.to_string()),
            SchedulingError::Repository(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

// ==============================================================================
// APPOINTMENT READ HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(|e| match e {
            SchedulingError::NotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointments = booking_service
        .list_patient_appointments(patient_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "patient_id": patient_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_provider_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointments = booking_service
        .list_provider_appointments(provider_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "provider_id": provider_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

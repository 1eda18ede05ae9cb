// libs/prescription-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use appointment_cell::services::booking::AppointmentBookingService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{PrescriptionError, PrescriptionQueryParams, UpsertPrescriptionRequest};
use crate::services::prescriptions::PrescriptionService;

fn map_store_error(e: PrescriptionError) -> AppError {
    match e {
        PrescriptionError::NotFound => {
            AppError::NotFound("Prescription not found".to_string())
        }
        PrescriptionError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        PrescriptionError::PaymentRequired => AppError::PaymentRequired(e.to_string()),
        PrescriptionError::ValidationError(msg) => AppError::ValidationError(msg),
        PrescriptionError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<PrescriptionQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = PrescriptionService::new(&state);

    let prescription = service
        .get_by_appointment(params.appointment_id, token)
        .await
        .map_err(map_store_error)?;

    let is_patient = prescription.patient_id.to_string() == user.id;
    let is_doctor = prescription.doctor_id.to_string() == user.id;

    if !is_patient && !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this prescription".to_string(),
        ));
    }

    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn upsert_prescription(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertPrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // Prescriptions are authored by the appointment's doctor
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(request.appointment_id, token)
        .await
        .map_err(|e| match e {
            appointment_cell::models::AppointmentError::NotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            other => AppError::Internal(other.to_string()),
        })?;

    let is_doctor = appointment.doctor_id.to_string() == user.id;

    if !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to prescribe for this appointment".to_string(),
        ));
    }

    let service = PrescriptionService::new(&state);

    let prescription = service
        .upsert(request, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "prescription": prescription,
        "message": "Prescription saved"
    })))
}

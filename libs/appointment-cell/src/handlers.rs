// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentQueryParams, BookAppointmentRequest, PaymentStatus,
    ScheduleMeetingRequest, UpdateAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;

fn map_store_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::InvalidTransition(status) => {
            AppError::Conflict(format!("Appointment cannot change state from status: {}", status))
        }
        AppointmentError::InvalidAmount(_) | AppointmentError::AlreadyPaid => {
            AppError::BadRequest(e.to_string())
        }
        AppointmentError::PaymentRequired => AppError::PaymentRequired(e.to_string()),
        AppointmentError::MeetingAlreadyScheduled => AppError::Conflict(e.to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // Only the patient themselves (or an admin) can book
    let is_patient = request.patient_id.to_string() == user.id;
    if !is_patient && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to book appointment for this patient".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .book_appointment(request, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<AppointmentQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = AppointmentBookingService::new(&state);

    let mut query = params;

    // Non-admins only ever see their own side of the ledger
    if !user.is_admin() {
        let own_id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::BadRequest("Invalid user id".to_string()))?;
        if user.is_doctor() {
            query.doctor_id = Some(own_id);
        } else {
            query.patient_id = Some(own_id);
        }
    }

    let appointments = booking_service
        .list_appointments(query, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_store_error)?;

    let is_patient = appointment.patient_id.to_string() == user.id;
    let is_doctor = appointment.doctor_id.to_string() == user.id;

    if !is_patient && !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_store_error)?;

    let is_patient = appointment.patient_id.to_string() == user.id;
    let is_doctor = appointment.doctor_id.to_string() == user.id;

    if !is_patient && !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to update this appointment".to_string(),
        ));
    }

    if request.status.is_some() && request.payment_status.is_some() {
        return Err(AppError::BadRequest(
            "Cannot update status and payment in the same request".to_string(),
        ));
    }

    if let Some(new_status) = request.status {
        // Status resolution belongs to the doctor
        if !is_doctor && !user.is_admin() {
            return Err(AppError::Auth(
                "Only the doctor can update appointment status".to_string(),
            ));
        }

        let updated = booking_service
            .update_status(appointment_id, new_status, token)
            .await
            .map_err(map_store_error)?;

        return Ok(Json(json!({
            "success": true,
            "appointment": updated,
            "message": "Appointment status updated"
        })));
    }

    if let Some(payment_status) = request.payment_status {
        // Payment belongs to the patient
        if !is_patient && !user.is_admin() {
            return Err(AppError::Auth(
                "Only the patient can pay for this appointment".to_string(),
            ));
        }

        if payment_status != PaymentStatus::Paid {
            return Err(AppError::BadRequest(
                "paymentStatus can only be set to paid".to_string(),
            ));
        }

        let amount = request.payment_amount.ok_or_else(|| {
            AppError::ValidationError("paymentAmount is required".to_string())
        })?;

        let updated = booking_service
            .record_payment(appointment_id, amount, token)
            .await
            .map_err(map_store_error)?;

        return Ok(Json(json!({
            "success": true,
            "appointment": updated,
            "message": "Payment recorded"
        })));
    }

    Err(AppError::BadRequest("Nothing to update".to_string()))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_store_error)?;

    let is_patient = appointment.patient_id.to_string() == user.id;

    if !is_patient && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to cancel this appointment".to_string(),
        ));
    }

    let cancelled = booking_service
        .cancel_appointment(appointment_id, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": cancelled,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn schedule_meeting(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleMeetingRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .get_appointment(request.appointment_id, token)
        .await
        .map_err(map_store_error)?;

    let is_doctor = appointment.doctor_id.to_string() == user.id;

    if !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Only the doctor can schedule the meeting".to_string(),
        ));
    }

    let updated = booking_service
        .schedule_meeting(request, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated,
        "message": "Meeting scheduled"
    })))
}

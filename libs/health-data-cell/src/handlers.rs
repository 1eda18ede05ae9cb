// libs/health-data-cell/src/handlers.rs
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

use crate::models::{AddBmiRequest, AddBpRequest, HealthDataError, HealthDataQueryParams};
use crate::services::metrics::HealthDataService;

fn map_store_error(e: HealthDataError) -> AppError {
    match e {
        HealthDataError::RecordNotFound(_) => AppError::NotFound(e.to_string()),
        HealthDataError::ValidationError(msg) => AppError::ValidationError(msg),
        HealthDataError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Resolve which patient's document the caller may touch: their own, or
/// any patient when an admin names one.
fn resolve_patient_id(user: &User, params: &HealthDataQueryParams) -> Result<Uuid, AppError> {
    if let Some(patient_id) = params.patient_id {
        if patient_id.to_string() != user.id && !user.is_admin() {
            return Err(AppError::Auth(
                "Not authorized to access health data for this patient".to_string(),
            ));
        }
        return Ok(patient_id);
    }

    Uuid::parse_str(&user.id).map_err(|_| AppError::BadRequest("Invalid user id".to_string()))
}

#[axum::debug_handler]
pub async fn get_health_data(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<HealthDataQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_id = resolve_patient_id(&user, &params)?;

    let service = HealthDataService::new(&state);

    let data = service
        .get_or_create(patient_id, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!(data)))
}

#[axum::debug_handler]
pub async fn add_bmi_record(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<HealthDataQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AddBmiRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_id = resolve_patient_id(&user, &params)?;

    let service = HealthDataService::new(&state);

    let data = service
        .add_bmi(patient_id, request, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "healthData": data,
        "message": "BMI record added"
    })))
}

#[axum::debug_handler]
pub async fn add_bp_record(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<HealthDataQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AddBpRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_id = resolve_patient_id(&user, &params)?;

    let service = HealthDataService::new(&state);

    let data = service
        .add_bp(patient_id, request, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "healthData": data,
        "message": "Blood pressure record added"
    })))
}

#[axum::debug_handler]
pub async fn delete_bmi_record(
    State(state): State<Arc<AppConfig>>,
    Path(index): Path<usize>,
    Query(params): Query<HealthDataQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_id = resolve_patient_id(&user, &params)?;

    let service = HealthDataService::new(&state);

    let data = service
        .delete_bmi(patient_id, index, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "healthData": data,
        "message": "BMI record removed"
    })))
}

#[axum::debug_handler]
pub async fn delete_bp_record(
    State(state): State<Arc<AppConfig>>,
    Path(index): Path<usize>,
    Query(params): Query<HealthDataQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_id = resolve_patient_id(&user, &params)?;

    let service = HealthDataService::new(&state);

    let data = service
        .delete_bp(patient_id, index, token)
        .await
        .map_err(map_store_error)?;

    Ok(Json(json!({
        "success": true,
        "healthData": data,
        "message": "Blood pressure record removed"
    })))
}

use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use health_data_cell::router::health_data_routes;
use prescription_cell::router::prescription_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "TreatWell API is running!" }))
        .nest("/api/appointments", appointment_routes(state.clone()))
        .nest("/api/prescriptions", prescription_routes(state.clone()))
        .nest("/api/health-data", health_data_routes(state.clone()))
}

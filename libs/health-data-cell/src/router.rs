// libs/health-data-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn health_data_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::get_health_data))
        .route("/bmi", post(handlers::add_bmi_record))
        .route("/bp", post(handlers::add_bp_record))
        .route("/bmi/{index}", delete(handlers::delete_bmi_record))
        .route("/bp/{index}", delete(handlers::delete_bp_record))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/slots", get(handlers::get_available_slots))
        .route("/exam-types", get(handlers::list_exam_types))
        .route("/admissions", post(handlers::create_admission))
        .route(
            "/admissions/{admission_id}/cancel",
            patch(handlers::cancel_admission),
        )
        .with_state(state)
}

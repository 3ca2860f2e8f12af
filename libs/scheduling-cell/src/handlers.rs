use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;
use shared_models::error::AppError;

use crate::models::{AvailableSlotsResponse, CreateAdmissionRequest, SlotQueryRequest};
use crate::services::{
    admission::AdmissionSchedulerService, engine::SlotAvailabilityEngine,
    store::RestExamTypeCatalog,
};

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SlotQueryRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = SlotAvailabilityEngine::new(&state);

    let slots = engine
        .compute_available_slots(query.date, &query.exam_type, query.doctor_id)
        .await?;

    let response = AvailableSlotsResponse {
        date: query.date,
        exam_type: query.exam_type,
        doctor_id: query.doctor_id,
        available_slots: slots,
    };

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn list_exam_types(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let catalog = RestExamTypeCatalog::new(Arc::new(PostgrestClient::new(&state)));

    let exam_types = catalog
        .active_exam_types()
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(Json(json!({
        "exam_types": exam_types,
        "total": exam_types.len()
    })))
}

#[axum::debug_handler]
pub async fn create_admission(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateAdmissionRequest>,
) -> Result<Json<Value>, AppError> {
    let scheduler = AdmissionSchedulerService::new(&state);

    let admission = scheduler.create_admission(request).await?;

    Ok(Json(json!(admission)))
}

#[axum::debug_handler]
pub async fn cancel_admission(
    State(state): State<Arc<AppConfig>>,
    Path(admission_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let scheduler = AdmissionSchedulerService::new(&state);

    let admission = scheduler.cancel_admission(admission_id).await?;

    Ok(Json(json!(admission)))
}

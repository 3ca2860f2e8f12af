use chrono::{NaiveTime, Timelike, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::{PostgrestClient, StoreError};

use crate::error::SchedulingError;
use crate::models::{Admission, CreateAdmissionRequest};
use crate::services::engine::SlotAvailabilityEngine;

/// Books admissions at slots offered by the availability engine. The
/// engine's output is advisory: between the availability check and the
/// insert another caller may take the slot, so the store's uniqueness
/// constraint on (doctor_id, scheduled_at) is the final arbiter and a
/// storage conflict surfaces as `SlotTaken`.
pub struct AdmissionSchedulerService {
    store: Arc<PostgrestClient>,
    engine: SlotAvailabilityEngine,
}

impl AdmissionSchedulerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(PostgrestClient::new(config)),
            engine: SlotAvailabilityEngine::new(config),
        }
    }

    pub fn with_engine(store: Arc<PostgrestClient>, engine: SlotAvailabilityEngine) -> Self {
        Self { store, engine }
    }

    pub async fn create_admission(
        &self,
        request: CreateAdmissionRequest,
    ) -> Result<Admission, SchedulingError> {
        info!(
            "Booking admission for patient {} on {} at {}",
            request.patient_id, request.date, request.start_time
        );

        let start_time = NaiveTime::from_hms_opt(
            request.start_time.hour(),
            request.start_time.minute(),
            0,
        )
        .ok_or_else(|| SchedulingError::ValidationError("Invalid start time".to_string()))?;

        let offered = self
            .engine
            .compute_available_slots(request.date, &request.exam_type, request.doctor_id)
            .await?;

        if !offered.contains(&start_time) {
            warn!(
                "Rejected admission at {} {}: not an offered start time",
                request.date, start_time
            );
            return Err(SchedulingError::SlotUnavailable(format!(
                "{} {} is not bookable for exam {}",
                request.date, start_time, request.exam_type
            )));
        }

        let scheduled_at = request.date.and_time(start_time).and_utc();
        let now = Utc::now();
        let admission_data = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "exam_type_code": request.exam_type,
            "scheduled_at": scheduled_at.to_rfc3339(),
            "status": "scheduled",
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/admissions",
                Some(admission_data),
                Some(headers),
            )
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => {
                    warn!("Slot {} {} taken between check and insert", request.date, start_time);
                    SchedulingError::SlotTaken(format!("{} {}", request.date, start_time))
                }
                other => SchedulingError::DatabaseError(other.to_string()),
            })?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::DatabaseError("Failed to create admission".to_string()))?;

        let admission: Admission = serde_json::from_value(row)
            .map_err(|err| SchedulingError::DatabaseError(err.to_string()))?;

        info!("Admission created with ID: {}", admission.id);
        Ok(admission)
    }

    pub async fn cancel_admission(&self, admission_id: Uuid) -> Result<Admission, SchedulingError> {
        info!("Cancelling admission: {}", admission_id);

        let path = format!("/rest/v1/admissions?id=eq.{}", admission_id);
        let update_data = json!({
            "status": "cancelled",
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .store
            .request_with_headers(Method::PATCH, &path, Some(update_data), Some(headers))
            .await
            .map_err(|err| SchedulingError::DatabaseError(err.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::NotFound(admission_id.to_string()))?;

        let admission: Admission = serde_json::from_value(row)
            .map_err(|err| SchedulingError::DatabaseError(err.to_string()))?;

        Ok(admission)
    }
}

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, SecondsFormat, Timelike};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::postgrest::{PostgrestClient, StoreError};

use crate::models::{Admission, ExamType, NonWorkingDay, Shift};
use crate::services::engine::{
    BookingLedger, ExamTypeCatalog, NonWorkingDayRegistry, ShiftCatalog,
};

// ==============================================================================
// SHIFT CATALOG
// ==============================================================================

pub struct RestShiftCatalog {
    store: Arc<PostgrestClient>,
}

impl RestShiftCatalog {
    pub fn new(store: Arc<PostgrestClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ShiftCatalog for RestShiftCatalog {
    async fn active_shifts(
        &self,
        day_of_week: i32,
        doctor_id: Option<Uuid>,
    ) -> Result<Vec<Shift>, StoreError> {
        let mut path = format!(
            "/rest/v1/shifts?day_of_week=eq.{}&active=eq.true&order=start_time.asc",
            day_of_week
        );

        // Superset query: the doctor's own shifts plus open shifts. The
        // engine applies the inclusion policy.
        if let Some(doctor) = doctor_id {
            path.push_str(&format!("&or=(doctor_id.eq.{},doctor_id.is.null)", doctor));
        }

        let result: Vec<Value> = self.store.request(Method::GET, &path, None).await?;

        let shifts: Vec<Shift> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Shift>, _>>()?;

        Ok(shifts)
    }
}

// ==============================================================================
// NON-WORKING DAY REGISTRY
// ==============================================================================

pub struct RestNonWorkingDayRegistry {
    store: Arc<PostgrestClient>,
}

impl RestNonWorkingDayRegistry {
    pub fn new(store: Arc<PostgrestClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NonWorkingDayRegistry for RestNonWorkingDayRegistry {
    async fn is_non_working_day(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/non_working_days?date=eq.{}", date);
        let result: Vec<Value> = self.store.request(Method::GET, &path, None).await?;

        let closures: Vec<NonWorkingDay> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<NonWorkingDay>, _>>()?;

        Ok(!closures.is_empty())
    }
}

// ==============================================================================
// EXAM TYPE CATALOG
// ==============================================================================

pub struct RestExamTypeCatalog {
    store: Arc<PostgrestClient>,
}

impl RestExamTypeCatalog {
    pub fn new(store: Arc<PostgrestClient>) -> Self {
        Self { store }
    }

    /// Active exam types for the booking UI, ordered by display name.
    pub async fn active_exam_types(&self) -> Result<Vec<ExamType>, StoreError> {
        let path = "/rest/v1/exam_types?active=eq.true&order=name.asc";
        let result: Vec<Value> = self.store.request(Method::GET, path, None).await?;

        let exam_types: Vec<ExamType> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ExamType>, _>>()?;

        Ok(exam_types)
    }
}

#[async_trait]
impl ExamTypeCatalog for RestExamTypeCatalog {
    async fn exam_type(&self, code: &str) -> Result<Option<ExamType>, StoreError> {
        let path = format!("/rest/v1/exam_types?code=eq.{}", code);
        let result: Vec<Value> = self.store.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }
}

// ==============================================================================
// BOOKING LEDGER
// ==============================================================================

pub struct RestBookingLedger {
    store: Arc<PostgrestClient>,
}

impl RestBookingLedger {
    pub fn new(store: Arc<PostgrestClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BookingLedger for RestBookingLedger {
    async fn occupied_start_times(
        &self,
        doctor_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, StoreError> {
        let start_of_day = date.and_time(NaiveTime::MIN).and_utc();
        let end_of_day = start_of_day + Duration::days(1);

        // Z-suffixed timestamps; a "+00:00" offset would decode as a space
        // inside the query string
        let mut query_parts = vec![
            format!(
                "scheduled_at=gte.{}",
                start_of_day.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            format!(
                "scheduled_at=lt.{}",
                end_of_day.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            "status=in.(scheduled,confirmed,in_progress)".to_string(),
        ];

        if let Some(doctor) = doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor));
        }

        let path = format!(
            "/rest/v1/admissions?{}&order=scheduled_at.asc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self.store.request(Method::GET, &path, None).await?;

        let admissions: Vec<Admission> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Admission>, _>>()?;

        debug!(
            "Ledger holds {} occupying admissions for doctor {:?} on {}",
            admissions.len(),
            doctor_id,
            date
        );

        // Start times rounded to the minute; seconds never participate in
        // the slot grid. The status predicate is reapplied locally so the
        // occupying category has a single definition.
        let start_times = admissions
            .iter()
            .filter(|admission| admission.status.occupies_slot())
            .filter_map(|admission| {
                let time = admission.scheduled_at.time();
                NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
            })
            .collect();

        Ok(start_times)
    }
}

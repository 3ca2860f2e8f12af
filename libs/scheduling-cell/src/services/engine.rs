use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::{PostgrestClient, StoreError};

use crate::error::SchedulingError;
use crate::models::{ExamType, Shift};
use crate::services::store::{
    RestBookingLedger, RestExamTypeCatalog, RestNonWorkingDayRegistry, RestShiftCatalog,
};

/// Probing granularity for the slot walk. Deliberately independent of the
/// exam duration: exams shorter or longer than the step still align to the
/// same grid of offered start times.
pub const SLOT_STEP_MINUTES: i64 = 15;

// ==============================================================================
// READ PORTS
// ==============================================================================

/// Active weekly shifts for a weekday. When a doctor is given the catalog
/// returns that doctor's shifts plus unassigned (open) shifts; the engine
/// decides whether open shifts count.
#[async_trait]
pub trait ShiftCatalog: Send + Sync {
    async fn active_shifts(
        &self,
        day_of_week: i32,
        doctor_id: Option<Uuid>,
    ) -> Result<Vec<Shift>, StoreError>;
}

#[async_trait]
pub trait NonWorkingDayRegistry: Send + Sync {
    async fn is_non_working_day(&self, date: NaiveDate) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ExamTypeCatalog: Send + Sync {
    async fn exam_type(&self, code: &str) -> Result<Option<ExamType>, StoreError>;
}

/// Start times (minute precision) of admissions that currently hold a slot
/// on the given date. `doctor_id = None` means any doctor.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    async fn occupied_start_times(
        &self,
        doctor_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, StoreError>;
}

// ==============================================================================
// ENGINE
// ==============================================================================

/// How shifts with no assigned doctor are treated when a specific doctor is
/// requested. `Exclude` reproduces the historical behavior: an open shift
/// contributes slots only to doctor-agnostic queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnassignedShiftPolicy {
    #[default]
    Exclude,
    Include,
}

pub struct SlotAvailabilityEngine {
    shifts: Arc<dyn ShiftCatalog>,
    calendar: Arc<dyn NonWorkingDayRegistry>,
    exam_types: Arc<dyn ExamTypeCatalog>,
    ledger: Arc<dyn BookingLedger>,
    policy: UnassignedShiftPolicy,
}

impl SlotAvailabilityEngine {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(PostgrestClient::new(config));
        Self::with_catalogs(
            Arc::new(RestShiftCatalog::new(Arc::clone(&store))),
            Arc::new(RestNonWorkingDayRegistry::new(Arc::clone(&store))),
            Arc::new(RestExamTypeCatalog::new(Arc::clone(&store))),
            Arc::new(RestBookingLedger::new(store)),
            UnassignedShiftPolicy::default(),
        )
    }

    pub fn with_catalogs(
        shifts: Arc<dyn ShiftCatalog>,
        calendar: Arc<dyn NonWorkingDayRegistry>,
        exam_types: Arc<dyn ExamTypeCatalog>,
        ledger: Arc<dyn BookingLedger>,
        policy: UnassignedShiftPolicy,
    ) -> Self {
        Self {
            shifts,
            calendar,
            exam_types,
            ledger,
            policy,
        }
    }

    /// Compute the ordered, de-duplicated list of bookable start times for a
    /// given date, exam type and optional doctor.
    ///
    /// An empty list is a valid answer (non-working day, no shifts, or full
    /// occupancy); the only request failure is an unknown or inactive exam
    /// code. The result is a snapshot: concurrent admissions may take a slot
    /// between this computation and a booking attempt, so the admission path
    /// re-verifies at persistence time.
    pub async fn compute_available_slots(
        &self,
        date: NaiveDate,
        exam_type_code: &str,
        doctor_id: Option<Uuid>,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        debug!(
            "Computing available slots for {} exam {} doctor {:?}",
            date, exam_type_code, doctor_id
        );

        let exam = self
            .exam_types
            .exam_type(exam_type_code)
            .await
            .map_err(catalog_unavailable)?;
        let exam = match exam {
            Some(exam) if exam.active && exam.duration_minutes > 0 => exam,
            _ => return Err(SchedulingError::InvalidExamType(exam_type_code.to_string())),
        };

        if self
            .calendar
            .is_non_working_day(date)
            .await
            .map_err(catalog_unavailable)?
        {
            debug!("{} is a non-working day, no slots", date);
            return Ok(Vec::new());
        }

        let day_of_week = day_of_week_index(date);
        let mut shifts = self
            .shifts
            .active_shifts(day_of_week, doctor_id)
            .await
            .map_err(catalog_unavailable)?;

        if doctor_id.is_some() && self.policy == UnassignedShiftPolicy::Exclude {
            shifts.retain(|shift| shift.doctor_id == doctor_id);
        }

        if shifts.is_empty() {
            debug!("No active shifts on weekday {} match the query", day_of_week);
            return Ok(Vec::new());
        }

        // One ledger read per distinct doctor, never one per probe. An open
        // shift is checked against the requested doctor's bookings, or
        // clinic-wide when no doctor was requested.
        let mut ledger_keys: Vec<Option<Uuid>> = shifts
            .iter()
            .map(|shift| shift.doctor_id.or(doctor_id))
            .collect();
        ledger_keys.sort();
        ledger_keys.dedup();

        let fetches = ledger_keys
            .iter()
            .map(|key| self.ledger.occupied_start_times(*key, date));
        let booked_lists = try_join_all(fetches)
            .await
            .map_err(catalog_unavailable)?;
        let booked_by_doctor: HashMap<Option<Uuid>, Vec<NaiveTime>> =
            ledger_keys.into_iter().zip(booked_lists).collect();

        let snapshot: Vec<(Shift, Vec<NaiveTime>)> = shifts
            .into_iter()
            .map(|shift| {
                let key = shift.doctor_id.or(doctor_id);
                let booked = booked_by_doctor.get(&key).cloned().unwrap_or_default();
                (shift, booked)
            })
            .collect();

        let slots = available_slots_from_snapshot(&snapshot, exam.duration_minutes as i64);
        debug!("Found {} bookable slots", slots.len());
        Ok(slots)
    }
}

fn catalog_unavailable(err: StoreError) -> SchedulingError {
    SchedulingError::CatalogUnavailable(err.to_string())
}

pub fn day_of_week_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Pure slot walk over a pre-fetched snapshot of shifts and their booked
/// start times. Each shift is probed on the fixed 15-minute grid; a probe
/// survives when the exam fits inside the shift and its half-open interval
/// `[t, t+d)` overlaps no booked interval `[b, b+d)`. Booked intervals use
/// the same exam duration as the candidate.
pub fn available_slots_from_snapshot(
    schedule: &[(Shift, Vec<NaiveTime>)],
    duration_minutes: i64,
) -> Vec<NaiveTime> {
    let mut slots = Vec::new();

    for (shift, booked) in schedule {
        let shift_start = minutes_from_midnight(shift.start_time);
        let shift_end = minutes_from_midnight(shift.end_time);
        let booked: Vec<i64> = booked.iter().map(|t| minutes_from_midnight(*t)).collect();

        let mut probe = shift_start;
        while probe + duration_minutes <= shift_end {
            let probe_end = probe + duration_minutes;
            let has_conflict = booked
                .iter()
                .any(|&b| probe < b + duration_minutes && b < probe_end);

            if !has_conflict {
                if let Some(time) = time_from_minutes(probe) {
                    slots.push(time);
                }
            }

            probe += SLOT_STEP_MINUTES;
        }
    }

    // Overlapping shifts can offer the same start time twice.
    slots.sort();
    slots.dedup();
    slots
}

fn minutes_from_midnight(time: NaiveTime) -> i64 {
    (time.hour() as i64) * 60 + time.minute() as i64
}

fn time_from_minutes(minutes: i64) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
}

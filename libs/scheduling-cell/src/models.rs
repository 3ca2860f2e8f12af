use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

/// One weekly working block for the clinic. A shift with no doctor is an
/// "open" shift any doctor may cover; whether it counts when a specific
/// doctor is requested is decided by the engine's UnassignedShiftPolicy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub duration_minutes: i32,
    pub active: bool,
}

/// Calendar exception (holiday, closure). A registered date has zero
/// availability regardless of shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonWorkingDay {
    pub date: NaiveDate,
    pub reason: Option<String>,
}

// ==============================================================================
// ADMISSION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admission {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub exam_type_code: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: AdmissionStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AdmissionStatus {
    /// Statuses that hold their time slot. Cancelled and no-show admissions
    /// free the slot for new bookings.
    pub fn occupies_slot(&self) -> bool {
        matches!(
            self,
            AdmissionStatus::Scheduled | AdmissionStatus::Confirmed | AdmissionStatus::InProgress
        )
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionStatus::Scheduled => write!(f, "scheduled"),
            AdmissionStatus::Confirmed => write!(f, "confirmed"),
            AdmissionStatus::InProgress => write!(f, "in_progress"),
            AdmissionStatus::Completed => write!(f, "completed"),
            AdmissionStatus::Cancelled => write!(f, "cancelled"),
            AdmissionStatus::NoShow => write!(f, "no_show"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQueryRequest {
    pub date: NaiveDate,
    pub exam_type: String,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub date: NaiveDate,
    pub exam_type: String,
    pub doctor_id: Option<Uuid>,
    pub available_slots: Vec<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdmissionRequest {
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub exam_type: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
}

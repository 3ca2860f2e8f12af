pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::SchedulingError;
pub use models::*;

// Re-export the engine surface consumed by other cells and tests
pub use services::engine::{
    available_slots_from_snapshot, day_of_week_index, BookingLedger, ExamTypeCatalog,
    NonWorkingDayRegistry, ShiftCatalog, SlotAvailabilityEngine, UnassignedShiftPolicy,
    SLOT_STEP_MINUTES,
};

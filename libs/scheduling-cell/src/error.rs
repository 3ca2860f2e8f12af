use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Unknown or inactive exam type: {0}")]
    InvalidExamType(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Requested slot is not available: {0}")]
    SlotUnavailable(String),

    #[error("Slot already taken: {0}")]
    SlotTaken(String),

    #[error("Admission not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::InvalidExamType(_) => AppError::ValidationError(err.to_string()),
            SchedulingError::CatalogUnavailable(_) => AppError::ExternalService(err.to_string()),
            SchedulingError::SlotUnavailable(_) => AppError::Conflict(err.to_string()),
            SchedulingError::SlotTaken(_) => AppError::Conflict(err.to_string()),
            SchedulingError::NotFound(_) => AppError::NotFound(err.to_string()),
            SchedulingError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            SchedulingError::DatabaseError(_) => AppError::Database(err.to_string()),
        }
    }
}

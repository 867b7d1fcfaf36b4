// libs/dentist-cell/src/models.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

/// One recurring weekly working window of a dentist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DentistAvailability {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DentistAvailability {
    /// True when `[start, end)` lies inside this window.
    pub fn covers(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.is_available && self.start_time <= start && end <= self.end_time
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start_time < end && start < self.end_time
    }
}

/// Day-of-week index used by availability rows, Sunday = 0.
pub fn day_of_week(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Availability not found")]
    NotFound,

    #[error("Not allowed to manage availability for this dentist")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Availability overlaps existing window {existing_id} ({start_time}-{end_time})")]
    Overlap {
        existing_id: Uuid,
        start_time: NaiveTime,
        end_time: NaiveTime,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        let message = err.to_string();
        match err {
            AvailabilityError::NotFound => AppError::NotFound(message),
            AvailabilityError::Forbidden => AppError::Forbidden(message),
            AvailabilityError::ValidationError(msg) => AppError::ValidationError(msg),
            AvailabilityError::Overlap { existing_id, start_time, end_time } => AppError::Conflict {
                message: "Availability window overlaps an existing window".to_string(),
                details: Some(serde_json::json!({
                    "existing_id": existing_id,
                    "start_time": start_time,
                    "end_time": end_time,
                })),
            },
            AvailabilityError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveTime};
use std::fmt;

use dental_service_cell::models::ServiceCatalogError;
use dentist_cell::models::AvailabilityError;
use shared_models::error::AppError;

pub const MAX_NOTES_LEN: usize = 500;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            date: self.appointment_date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this status occupies its time slot.
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// A half-open `[start_time, end_time)` range on one calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Only the occupied intervals are exposed; the bookings behind them stay private.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_slots: Vec<TimeSlot>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Service not found or no longer offered")]
    ServiceNotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The candidate is handed back untouched so the booking form can be re-presented.
    #[error("Appointment conflicts with existing booking")]
    ConflictDetected {
        candidate: Box<CreateAppointmentRequest>,
        conflicting: Option<TimeSlot>,
    },

    /// Raised by persistence when a uniqueness/exclusion constraint rejects an insert.
    #[error("Appointment slot not available")]
    SlotUnavailable,

    #[error("Appointment {id} was modified concurrently (expected version {expected_version})")]
    StaleWrite { id: Uuid, expected_version: i64 },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ServiceCatalogError> for AppointmentError {
    fn from(err: ServiceCatalogError) -> Self {
        match err {
            ServiceCatalogError::NotFound => AppointmentError::ServiceNotFound,
            ServiceCatalogError::Forbidden => {
                AppointmentError::Forbidden("Only administrators can manage services".to_string())
            }
            ServiceCatalogError::ValidationError(msg) => AppointmentError::ValidationError(msg),
            ServiceCatalogError::StaleWrite { id, expected_version } => {
                AppointmentError::StaleWrite { id, expected_version }
            }
            ServiceCatalogError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

impl From<AvailabilityError> for AppointmentError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
            other => AppointmentError::ValidationError(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let message = err.to_string();
        match err {
            AppointmentError::NotFound | AppointmentError::ServiceNotFound => AppError::NotFound(message),
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidStatusTransition { .. } => AppError::ValidationError(message),
            AppointmentError::ConflictDetected { candidate, conflicting } => AppError::Conflict {
                message: "This time slot is already booked. Please choose another time.".to_string(),
                details: Some(json!({
                    "candidate": candidate,
                    "conflicting_slot": conflicting,
                })),
            },
            AppointmentError::SlotUnavailable => AppError::conflict(message),
            AppointmentError::StaleWrite { id, expected_version } => AppError::Conflict {
                message,
                details: Some(json!({
                    "appointment_id": id,
                    "expected_version": expected_version,
                    "action": "reload",
                })),
            },
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

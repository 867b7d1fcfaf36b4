// libs/dental-service-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_PRICE: f64 = 10_000.0;
pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 180;

/// A bookable treatment. Rows are soft-deleted through `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DentalService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
    pub is_active: bool,
    /// Version the editor loaded; the write is rejected if the row moved on.
    pub expected_version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ServiceCatalogError {
    #[error("Service not found")]
    NotFound,

    #[error("Only administrators can manage services")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Service {id} was modified concurrently (expected version {expected_version})")]
    StaleWrite { id: Uuid, expected_version: i64 },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ServiceCatalogError> for AppError {
    fn from(err: ServiceCatalogError) -> Self {
        let message = err.to_string();
        match err {
            ServiceCatalogError::NotFound => AppError::NotFound(message),
            ServiceCatalogError::Forbidden => AppError::Forbidden(message),
            ServiceCatalogError::ValidationError(msg) => AppError::ValidationError(msg),
            ServiceCatalogError::StaleWrite { id, expected_version } => AppError::Conflict {
                message,
                details: Some(serde_json::json!({
                    "service_id": id,
                    "expected_version": expected_version,
                    "action": "reload",
                })),
            },
            ServiceCatalogError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

/// Checks every field and reports all violations at once.
pub fn validate_service_fields(
    name: &str,
    description: Option<&str>,
    price: f64,
    duration_minutes: i32,
) -> Result<(), ServiceCatalogError> {
    let mut problems = Vec::new();

    let name = name.trim();
    if name.is_empty() {
        problems.push("name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        problems.push(format!("name must be at most {} characters", MAX_NAME_LEN));
    }

    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            problems.push(format!("description must be at most {} characters", MAX_DESCRIPTION_LEN));
        }
    }

    if !price.is_finite() || !(0.0..=MAX_PRICE).contains(&price) {
        problems.push(format!("price must be between 0 and {}", MAX_PRICE));
    }

    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        problems.push(format!(
            "duration must be between {} and {} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ServiceCatalogError::ValidationError(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_range_boundaries() {
        assert!(validate_service_fields("Exam", None, 0.0, 15).is_ok());
        assert!(validate_service_fields("Implant", None, 10_000.0, 180).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let err = validate_service_fields("  ", None, -1.0, 200).unwrap_err();
        assert_matches!(err, ServiceCatalogError::ValidationError(ref msg)
            if msg.contains("name") && msg.contains("price") && msg.contains("duration"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(validate_service_fields("Exam", None, 10_000.01, 30).is_err());
        assert!(validate_service_fields("Exam", None, f64::NAN, 30).is_err());
        assert!(validate_service_fields("Exam", None, 50.0, 14).is_err());
        assert!(validate_service_fields("Exam", Some(&"x".repeat(501)), 50.0, 30).is_err());
        assert!(validate_service_fields(&"x".repeat(101), None, 50.0, 30).is_err());
    }
}

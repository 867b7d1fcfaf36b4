use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::CreateAvailabilityRequest;
use crate::services::availability::AvailabilityService;

#[axum::debug_handler]
pub async fn get_dentist_availability(
    State(service): State<Arc<AvailabilityService>>,
    Path(dentist_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let availability = service.list_availability(dentist_id).await?;

    Ok(Json(json!({
        "dentist_id": dentist_id,
        "availability": availability
    })))
}

#[axum::debug_handler]
pub async fn create_availability(
    State(service): State<Arc<AvailabilityService>>,
    Path(dentist_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let availability = service.set_availability(&actor, dentist_id, request).await?;

    Ok((StatusCode::CREATED, Json(json!(availability))))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(service): State<Arc<AvailabilityService>>,
    Path(availability_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let availability = service.remove_availability(&actor, availability_id).await?;

    Ok(Json(json!({
        "success": true,
        "availability": availability
    })))
}

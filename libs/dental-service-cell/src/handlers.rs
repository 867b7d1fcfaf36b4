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

use crate::models::{CreateServiceRequest, UpdateServiceRequest};
use crate::services::catalog::CatalogService;

#[axum::debug_handler]
pub async fn list_services(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<Value>, AppError> {
    let services = catalog.list_active_services().await?;

    Ok(Json(json!({
        "services": services,
        "total": services.len()
    })))
}

#[axum::debug_handler]
pub async fn get_service(
    State(catalog): State<Arc<CatalogService>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = catalog.get_service(service_id).await?;
    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn create_service(
    State(catalog): State<Arc<CatalogService>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = catalog.create_service(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(json!(service))))
}

#[axum::debug_handler]
pub async fn update_service(
    State(catalog): State<Arc<CatalogService>>,
    Path(service_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let service = catalog.update_service(&actor, service_id, request).await?;
    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn deactivate_service(
    State(catalog): State<Arc<CatalogService>>,
    Path(service_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let service = catalog.deactivate_service(&actor, service_id).await?;

    Ok(Json(json!({
        "success": true,
        "service": service,
        "message": "Service deactivated"
    })))
}

// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{CreateAppointmentRequest, UpdateStatusRequest};
use crate::services::booking::AppointmentBookingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Defaults to today (UTC) when absent.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub from: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SlotCheckQuery {
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ==============================================================================
// BOOKING AND LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(engine): State<Arc<AppointmentBookingService>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = engine.create_appointment(&actor, request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine.get_appointment(&actor, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine.cancel_appointment(&actor, appointment_id).await?;
    info!("Appointment {} cancelled via API", appointment_id);

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine.update_status(&actor, appointment_id, request.status).await?;
    Ok(Json(json!(appointment)))
}

// ==============================================================================
// LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(patient_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointments = engine.list_for_patient(&actor, patient_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dentist_appointments(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(dentist_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointments = engine.list_for_dentist(&actor, dentist_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dentist_schedule(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(dentist_id): Path<Uuid>,
    Query(params): Query<DateQuery>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let date = params.date.unwrap_or_else(today);
    let appointments = engine.dentist_schedule(&actor, dentist_id, date).await?;

    Ok(Json(json!({
        "date": date,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_dentist_day(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(dentist_id): Path<Uuid>,
    Query(params): Query<DateQuery>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let date = params.date.unwrap_or_else(today);
    let appointments = engine.dentist_day(&actor, dentist_id, date).await?;

    Ok(Json(json!({
        "date": date,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dentist_upcoming(
    State(engine): State<Arc<AppointmentBookingService>>,
    Path(dentist_id): Path<Uuid>,
    Query(params): Query<UpcomingQuery>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let from = params.from.unwrap_or_else(today);
    let appointments = engine.dentist_upcoming(&actor, dentist_id, from).await?;

    Ok(Json(json!({
        "from": from,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

// ==============================================================================
// UTILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn check_slot(
    State(engine): State<Arc<AppointmentBookingService>>,
    Query(params): Query<SlotCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let response = engine
        .check_slot(params.dentist_id, params.date, params.start_time, params.end_time)
        .await?;

    Ok(Json(json!(response)))
}

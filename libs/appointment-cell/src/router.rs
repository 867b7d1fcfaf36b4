// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::booking::AppointmentBookingService;

pub fn appointment_routes(config: Arc<AppConfig>, engine: Arc<AppointmentBookingService>) -> Router {
    // All appointment operations require authentication
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))

        // Listings
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/dentists/{dentist_id}", get(handlers::get_dentist_appointments))
        .route("/dentists/{dentist_id}/schedule", get(handlers::get_dentist_schedule))
        .route("/dentists/{dentist_id}/day", get(handlers::get_dentist_day))
        .route("/dentists/{dentist_id}/upcoming", get(handlers::get_dentist_upcoming))

        .route("/slots/check", get(handlers::check_slot))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(engine)
}

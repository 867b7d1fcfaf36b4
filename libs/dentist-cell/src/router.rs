use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::availability::AvailabilityService;

pub fn dentist_routes(config: Arc<AppConfig>, service: Arc<AvailabilityService>) -> Router {
    let public_routes = Router::new()
        .route("/{dentist_id}/availability", get(handlers::get_dentist_availability));

    let protected_routes = Router::new()
        .route("/{dentist_id}/availability", post(handlers::create_availability))
        .route("/availability/{availability_id}", delete(handlers::delete_availability))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(service)
}

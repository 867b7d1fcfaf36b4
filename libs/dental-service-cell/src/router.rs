use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::catalog::CatalogService;

pub fn service_routes(config: Arc<AppConfig>, catalog: Arc<CatalogService>) -> Router {
    // Every catalog operation requires authentication; mutations are admin-only.
    Router::new()
        .route("/", get(handlers::list_services).post(handlers::create_service))
        .route(
            "/{service_id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::deactivate_service),
        )
        .route_layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(catalog)
}

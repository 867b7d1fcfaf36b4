use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use tracing::info;

use appointment_cell::repository::{AppointmentRepository, InMemoryAppointmentRepository, SupabaseAppointmentRepository};
use appointment_cell::router::appointment_routes;
use appointment_cell::services::booking::AppointmentBookingService;
use dental_service_cell::repository::{InMemoryServiceRepository, ServiceRepository, SupabaseServiceRepository};
use dental_service_cell::router::service_routes;
use dental_service_cell::services::catalog::CatalogService;
use dentist_cell::repository::{AvailabilityRepository, InMemoryAvailabilityRepository, SupabaseAvailabilityRepository};
use dentist_cell::router::dentist_routes;
use dentist_cell::services::availability::AvailabilityService;
use shared_config::{AppConfig, StorageBackend};
use shared_database::supabase::SupabaseClient;

/// Service graph shared by every cell router.
pub struct Services {
    pub catalog: Arc<CatalogService>,
    pub availability: Arc<AvailabilityService>,
    pub booking: Arc<AppointmentBookingService>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Self {
        let (appointments, services, availability): (
            Arc<dyn AppointmentRepository>,
            Arc<dyn ServiceRepository>,
            Arc<dyn AvailabilityRepository>,
        ) = match config.storage_backend {
            StorageBackend::Supabase => {
                info!("Using Supabase storage at {}", config.supabase_url);
                let client = Arc::new(SupabaseClient::new(config));
                (
                    Arc::new(SupabaseAppointmentRepository::new(client.clone())),
                    Arc::new(SupabaseServiceRepository::new(client.clone())),
                    Arc::new(SupabaseAvailabilityRepository::new(client)),
                )
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage; data is lost on restart");
                (
                    Arc::new(InMemoryAppointmentRepository::new()),
                    Arc::new(InMemoryServiceRepository::new()),
                    Arc::new(InMemoryAvailabilityRepository::new()),
                )
            }
        };

        let catalog = Arc::new(CatalogService::new(services));
        let availability = Arc::new(AvailabilityService::new(availability));
        let booking = Arc::new(AppointmentBookingService::new(
            appointments,
            catalog.clone(),
            availability.clone(),
            config.booking_policy,
        ));

        Self { catalog, availability, booking }
    }
}

pub fn create_router(config: Arc<AppConfig>, services: Services) -> Router {
    Router::new()
        .route("/", get(|| async { "ToothSlot API is running!" }))
        .nest("/appointments", appointment_routes(config.clone(), services.booking))
        .nest("/services", service_routes(config.clone(), services.catalog))
        .nest("/dentists", dentist_routes(config, services.availability))
}

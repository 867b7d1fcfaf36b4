// libs/dental-service-cell/src/services/catalog.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::Actor;

use crate::models::{
    validate_service_fields, CreateServiceRequest, DentalService, ServiceCatalogError,
    UpdateServiceRequest,
};
use crate::repository::ServiceRepository;

pub struct CatalogService {
    repository: Arc<dyn ServiceRepository>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn ServiceRepository>) -> Self {
        Self { repository }
    }

    /// Services offered for booking, ordered by name.
    pub async fn list_active_services(&self) -> Result<Vec<DentalService>, ServiceCatalogError> {
        self.repository.list_active().await
    }

    pub async fn get_service(&self, service_id: Uuid) -> Result<DentalService, ServiceCatalogError> {
        self.repository.get(service_id).await?
            .ok_or(ServiceCatalogError::NotFound)
    }

    pub async fn create_service(
        &self,
        actor: &Actor,
        request: CreateServiceRequest,
    ) -> Result<DentalService, ServiceCatalogError> {
        Self::ensure_admin(actor)?;
        validate_service_fields(
            &request.name,
            request.description.as_deref(),
            request.price,
            request.duration_minutes,
        )?;

        let service = DentalService {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            price: request.price,
            duration_minutes: request.duration_minutes,
            is_active: true,
            version: 1,
            created_at: Utc::now(),
            updated_at: None,
        };

        let created = self.repository.insert(service).await?;
        info!("Service {} ({}) created", created.id, created.name);
        Ok(created)
    }

    pub async fn update_service(
        &self,
        actor: &Actor,
        service_id: Uuid,
        request: UpdateServiceRequest,
    ) -> Result<DentalService, ServiceCatalogError> {
        Self::ensure_admin(actor)?;
        validate_service_fields(
            &request.name,
            request.description.as_deref(),
            request.price,
            request.duration_minutes,
        )?;

        let current = self.get_service(service_id).await?;
        if current.version != request.expected_version {
            warn!("Stale edit of service {}: expected version {}, found {}",
                  service_id, request.expected_version, current.version);
            return Err(ServiceCatalogError::StaleWrite {
                id: service_id,
                expected_version: request.expected_version,
            });
        }

        let edited = DentalService {
            name: request.name.trim().to_string(),
            description: request.description,
            price: request.price,
            duration_minutes: request.duration_minutes,
            is_active: request.is_active,
            updated_at: Some(Utc::now()),
            ..current
        };

        let updated = self.repository
            .update_if_version(edited, request.expected_version)
            .await?;
        info!("Service {} updated to version {}", updated.id, updated.version);
        Ok(updated)
    }

    /// Soft delete. Appointments already referencing the service are left untouched.
    pub async fn deactivate_service(
        &self,
        actor: &Actor,
        service_id: Uuid,
    ) -> Result<DentalService, ServiceCatalogError> {
        Self::ensure_admin(actor)?;
        debug!("Deactivating service {}", service_id);

        let current = self.get_service(service_id).await?;
        if !current.is_active {
            return Ok(current);
        }

        let expected_version = current.version;
        let deactivated = DentalService {
            is_active: false,
            updated_at: Some(Utc::now()),
            ..current
        };

        let updated = self.repository
            .update_if_version(deactivated, expected_version)
            .await?;
        info!("Service {} deactivated", service_id);
        Ok(updated)
    }

    fn ensure_admin(actor: &Actor) -> Result<(), ServiceCatalogError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(ServiceCatalogError::Forbidden)
        }
    }
}

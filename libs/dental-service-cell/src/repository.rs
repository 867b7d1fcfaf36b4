// libs/dental-service-cell/src/repository.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{DentalService, ServiceCatalogError};

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn insert(&self, service: DentalService) -> Result<DentalService, ServiceCatalogError>;

    async fn get(&self, id: Uuid) -> Result<Option<DentalService>, ServiceCatalogError>;

    /// Active services ordered by name.
    async fn list_active(&self) -> Result<Vec<DentalService>, ServiceCatalogError>;

    /// Replaces the row only if its stored version still equals `expected_version`.
    /// The stored row gets `expected_version + 1`.
    async fn update_if_version(
        &self,
        service: DentalService,
        expected_version: i64,
    ) -> Result<DentalService, ServiceCatalogError>;
}

#[derive(Default)]
pub struct InMemoryServiceRepository {
    rows: RwLock<HashMap<Uuid, DentalService>>,
}

impl InMemoryServiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceRepository for InMemoryServiceRepository {
    async fn insert(&self, service: DentalService) -> Result<DentalService, ServiceCatalogError> {
        self.rows.write().await.insert(service.id, service.clone());
        Ok(service)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DentalService>, ServiceCatalogError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<DentalService>, ServiceCatalogError> {
        let mut services: Vec<DentalService> = self.rows.read().await
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn update_if_version(
        &self,
        mut service: DentalService,
        expected_version: i64,
    ) -> Result<DentalService, ServiceCatalogError> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&service.id).ok_or(ServiceCatalogError::NotFound)?;

        if row.version != expected_version {
            return Err(ServiceCatalogError::StaleWrite { id: service.id, expected_version });
        }

        service.version = expected_version + 1;
        *row = service.clone();
        Ok(service)
    }
}

/// PostgREST-backed store over the `dental_services` table.
pub struct SupabaseServiceRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseServiceRepository {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<DentalService>, ServiceCatalogError> {
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DentalService>, _>>()
            .map_err(|e| ServiceCatalogError::DatabaseError(format!("Failed to parse services: {}", e)))
    }
}

#[async_trait]
impl ServiceRepository for SupabaseServiceRepository {
    async fn insert(&self, service: DentalService) -> Result<DentalService, ServiceCatalogError> {
        let body = serde_json::to_value(&service)
            .map_err(|e| ServiceCatalogError::DatabaseError(e.to_string()))?;

        let rows: Vec<Value> = self.supabase
            .request(Method::POST, "/rest/v1/dental_services", None, Some(body))
            .await
            .map_err(|e| ServiceCatalogError::DatabaseError(e.to_string()))?;

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceCatalogError::DatabaseError("Insert returned no rows".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<DentalService>, ServiceCatalogError> {
        let path = format!("/rest/v1/dental_services?id=eq.{}", id);
        let rows = self.supabase.select(&path).await
            .map_err(|e| ServiceCatalogError::DatabaseError(e.to_string()))?;
        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn list_active(&self) -> Result<Vec<DentalService>, ServiceCatalogError> {
        let rows = self.supabase
            .select("/rest/v1/dental_services?is_active=eq.true&order=name.asc")
            .await
            .map_err(|e| ServiceCatalogError::DatabaseError(e.to_string()))?;
        Self::parse_rows(rows)
    }

    async fn update_if_version(
        &self,
        service: DentalService,
        expected_version: i64,
    ) -> Result<DentalService, ServiceCatalogError> {
        let path = format!(
            "/rest/v1/dental_services?id=eq.{}&version=eq.{}",
            service.id, expected_version
        );
        let body = json!({
            "name": service.name,
            "description": service.description,
            "price": service.price,
            "duration_minutes": service.duration_minutes,
            "is_active": service.is_active,
            "version": expected_version + 1,
            "updated_at": service.updated_at,
        });

        let rows: Vec<Value> = self.supabase
            .request(Method::PATCH, &path, None, Some(body))
            .await
            .map_err(|e| ServiceCatalogError::DatabaseError(e.to_string()))?;

        match Self::parse_rows(rows)?.into_iter().next() {
            Some(updated) => Ok(updated),
            // Zero rows matched: either the row is gone or its version moved.
            None => match self.get(service.id).await? {
                Some(_) => Err(ServiceCatalogError::StaleWrite { id: service.id, expected_version }),
                None => Err(ServiceCatalogError::NotFound),
            },
        }
    }
}

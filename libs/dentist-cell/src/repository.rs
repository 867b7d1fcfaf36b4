// libs/dentist-cell/src/repository.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityError, DentistAvailability};

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn insert(&self, availability: DentistAvailability) -> Result<DentistAvailability, AvailabilityError>;

    async fn get(&self, id: Uuid) -> Result<Option<DentistAvailability>, AvailabilityError>;

    /// All windows of a dentist ordered by day, then start time.
    async fn list_for_dentist(&self, dentist_id: Uuid) -> Result<Vec<DentistAvailability>, AvailabilityError>;

    async fn update(&self, availability: DentistAvailability) -> Result<DentistAvailability, AvailabilityError>;
}

#[derive(Default)]
pub struct InMemoryAvailabilityRepository {
    rows: RwLock<HashMap<Uuid, DentistAvailability>>,
}

impl InMemoryAvailabilityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryAvailabilityRepository {
    async fn insert(&self, availability: DentistAvailability) -> Result<DentistAvailability, AvailabilityError> {
        self.rows.write().await.insert(availability.id, availability.clone());
        Ok(availability)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DentistAvailability>, AvailabilityError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list_for_dentist(&self, dentist_id: Uuid) -> Result<Vec<DentistAvailability>, AvailabilityError> {
        let mut windows: Vec<DentistAvailability> = self.rows.read().await
            .values()
            .filter(|a| a.dentist_id == dentist_id)
            .cloned()
            .collect();
        windows.sort_by_key(|a| (a.day_of_week, a.start_time));
        Ok(windows)
    }

    async fn update(&self, availability: DentistAvailability) -> Result<DentistAvailability, AvailabilityError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&availability.id) {
            Some(row) => {
                *row = availability.clone();
                Ok(availability)
            }
            None => Err(AvailabilityError::NotFound),
        }
    }
}

/// PostgREST-backed store over the `dentist_availabilities` table.
pub struct SupabaseAvailabilityRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAvailabilityRepository {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn parse_rows(rows: Vec<serde_json::Value>) -> Result<Vec<DentistAvailability>, AvailabilityError> {
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DentistAvailability>, _>>()
            .map_err(|e| AvailabilityError::DatabaseError(format!("Failed to parse availability: {}", e)))
    }
}

#[async_trait]
impl AvailabilityRepository for SupabaseAvailabilityRepository {
    async fn insert(&self, availability: DentistAvailability) -> Result<DentistAvailability, AvailabilityError> {
        let body = serde_json::to_value(&availability)
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;

        let rows: Vec<serde_json::Value> = self.supabase
            .request(Method::POST, "/rest/v1/dentist_availabilities", None, Some(body))
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AvailabilityError::DatabaseError("Insert returned no rows".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<DentistAvailability>, AvailabilityError> {
        let path = format!("/rest/v1/dentist_availabilities?id=eq.{}", id);
        let rows = self.supabase.select(&path).await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;
        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn list_for_dentist(&self, dentist_id: Uuid) -> Result<Vec<DentistAvailability>, AvailabilityError> {
        let path = format!(
            "/rest/v1/dentist_availabilities?dentist_id=eq.{}&order=day_of_week.asc,start_time.asc",
            dentist_id
        );
        let rows = self.supabase.select(&path).await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;
        Self::parse_rows(rows)
    }

    async fn update(&self, availability: DentistAvailability) -> Result<DentistAvailability, AvailabilityError> {
        let path = format!("/rest/v1/dentist_availabilities?id=eq.{}", availability.id);
        let body = json!({
            "start_time": availability.start_time,
            "end_time": availability.end_time,
            "is_available": availability.is_available,
            "updated_at": availability.updated_at,
        });

        let rows: Vec<serde_json::Value> = self.supabase
            .request(Method::PATCH, &path, None, Some(body))
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or(AvailabilityError::NotFound)
    }
}

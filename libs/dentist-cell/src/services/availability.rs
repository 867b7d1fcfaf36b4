// libs/dentist-cell/src/services/availability.rs

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::Actor;

use crate::models::{
    day_of_week, AvailabilityError, CreateAvailabilityRequest, DentistAvailability,
};
use crate::repository::AvailabilityRepository;

pub struct AvailabilityService {
    repository: Arc<dyn AvailabilityRepository>,
}

impl AvailabilityService {
    pub fn new(repository: Arc<dyn AvailabilityRepository>) -> Self {
        Self { repository }
    }

    /// Add a weekly working window for a dentist.
    pub async fn set_availability(
        &self,
        actor: &Actor,
        dentist_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<DentistAvailability, AvailabilityError> {
        debug!("Creating availability for dentist: {}", dentist_id);

        Self::ensure_can_manage(actor, dentist_id)?;

        if !(0..=6).contains(&request.day_of_week) {
            return Err(AvailabilityError::ValidationError(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        if request.start_time >= request.end_time {
            return Err(AvailabilityError::ValidationError(
                "Start time must be before end time".to_string(),
            ));
        }

        let existing = self.repository.list_for_dentist(dentist_id).await?;
        if let Some(clash) = existing.iter().find(|w| {
            w.is_available
                && w.day_of_week == request.day_of_week
                && w.overlaps(request.start_time, request.end_time)
        }) {
            warn!("Availability for dentist {} overlaps window {}", dentist_id, clash.id);
            return Err(AvailabilityError::Overlap {
                existing_id: clash.id,
                start_time: clash.start_time,
                end_time: clash.end_time,
            });
        }

        let availability = DentistAvailability {
            id: Uuid::new_v4(),
            dentist_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            is_available: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let created = self.repository.insert(availability).await?;
        info!("Availability {} created for dentist {}", created.id, dentist_id);
        Ok(created)
    }

    pub async fn list_availability(
        &self,
        dentist_id: Uuid,
    ) -> Result<Vec<DentistAvailability>, AvailabilityError> {
        self.repository.list_for_dentist(dentist_id).await
    }

    /// Windows are never deleted; removal flips `is_available` off.
    pub async fn remove_availability(
        &self,
        actor: &Actor,
        availability_id: Uuid,
    ) -> Result<DentistAvailability, AvailabilityError> {
        let mut availability = self.repository.get(availability_id).await?
            .ok_or(AvailabilityError::NotFound)?;

        Self::ensure_can_manage(actor, availability.dentist_id)?;

        availability.is_available = false;
        availability.updated_at = Some(Utc::now());

        let updated = self.repository.update(availability).await?;
        info!("Availability {} disabled", updated.id);
        Ok(updated)
    }

    /// Whether `[start, end)` on `date` falls inside one available window of the dentist.
    pub async fn is_within_availability(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<bool, AvailabilityError> {
        let weekday = day_of_week(date);
        let windows = self.repository.list_for_dentist(dentist_id).await?;

        Ok(windows
            .iter()
            .any(|w| w.day_of_week == weekday && w.covers(start, end)))
    }

    fn ensure_can_manage(actor: &Actor, dentist_id: Uuid) -> Result<(), AvailabilityError> {
        if actor.is_dentist(dentist_id) || actor.is_admin() {
            Ok(())
        } else {
            Err(AvailabilityError::Forbidden)
        }
    }
}

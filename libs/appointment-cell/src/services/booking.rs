// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use dental_service_cell::models::DentalService;
use dental_service_cell::services::catalog::CatalogService;
use dentist_cell::services::availability::AvailabilityService;
use shared_config::BookingPolicy;
use shared_models::auth::{Actor, Role};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, ConflictCheckResponse,
    CreateAppointmentRequest, MAX_NOTES_LEN,
};
use crate::repository::AppointmentRepository;
use crate::services::conflict::{compute_end_time, ConflictDetectionService};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::locks::SchedulingLocks;

pub const UPCOMING_WINDOW_DAYS: u64 = 7;

pub struct AppointmentBookingService {
    repository: Arc<dyn AppointmentRepository>,
    catalog: Arc<CatalogService>,
    availability: Arc<AvailabilityService>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    locks: SchedulingLocks,
    policy: BookingPolicy,
}

impl AppointmentBookingService {
    pub fn new(
        repository: Arc<dyn AppointmentRepository>,
        catalog: Arc<CatalogService>,
        availability: Arc<AvailabilityService>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(repository.clone()),
            lifecycle_service: AppointmentLifecycleService::new(),
            locks: SchedulingLocks::new(),
            repository,
            catalog,
            availability,
            policy,
        }
    }

    /// Book an appointment as a patient. End time is derived from the service duration.
    #[instrument(skip(self, actor, request), fields(dentist_id = %request.dentist_id, date = %request.appointment_date))]
    pub async fn create_appointment(
        &self,
        actor: &Actor,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if !actor.is_patient(request.patient_id) {
            return Err(AppointmentError::Forbidden(
                "Appointments can only be booked by the patient themselves".to_string(),
            ));
        }

        if let Some(notes) = &request.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(AppointmentError::ValidationError(format!(
                    "notes must be at most {} characters", MAX_NOTES_LEN
                )));
            }
        }

        let service = self.bookable_service(request.service_id).await?;

        let end_time = compute_end_time(request.start_time, service.duration_minutes)
            .ok_or_else(|| AppointmentError::ValidationError(format!(
                "{} starting at {} would end at or after midnight",
                service.name, request.start_time
            )))?;

        if self.policy.enforce_dentist_availability {
            let inside = self.availability
                .is_within_availability(request.dentist_id, request.appointment_date, request.start_time, end_time)
                .await?;
            if !inside {
                return Err(AppointmentError::ValidationError(
                    "Requested time is outside the dentist's working hours".to_string(),
                ));
            }
        }

        let _guard = self.locks.acquire(request.dentist_id, request.appointment_date).await;

        let conflicting = self.conflict_service
            .find_conflicting(request.dentist_id, request.appointment_date, request.start_time, end_time, None)
            .await?;

        if let Some(existing) = conflicting.first() {
            warn!("Rejecting booking {}-{}: overlaps appointment {}",
                  request.start_time, end_time, existing.id);
            return Err(AppointmentError::ConflictDetected {
                conflicting: Some(existing.slot()),
                candidate: Box::new(request),
            });
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            dentist_id: request.dentist_id,
            service_id: service.id,
            appointment_date: request.appointment_date,
            start_time: request.start_time,
            end_time,
            status: AppointmentStatus::Pending,
            notes: request.notes.clone(),
            version: 1,
            created_at: Utc::now(),
            updated_at: None,
        };

        let created = match self.repository.insert(appointment).await {
            Ok(created) => created,
            Err(AppointmentError::SlotUnavailable) => {
                return Err(AppointmentError::ConflictDetected {
                    conflicting: None,
                    candidate: Box::new(request),
                });
            }
            Err(e) => return Err(e),
        };

        info!("Appointment {} booked for patient {} ({} {}-{})",
              created.id, created.patient_id, created.appointment_date, created.start_time, created.end_time);
        Ok(created)
    }

    pub async fn cancel_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.find(appointment_id).await?;

        if !actor.is_patient(appointment.patient_id) {
            return Err(AppointmentError::Forbidden(
                "Only the patient who booked the appointment can cancel it".to_string(),
            ));
        }

        self.transition(appointment, Role::Patient, AppointmentStatus::Cancelled).await
    }

    pub async fn update_status(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.find(appointment_id).await?;

        if !actor.is_dentist(appointment.dentist_id) {
            return Err(AppointmentError::Forbidden(
                "Only the assigned dentist can update this appointment".to_string(),
            ));
        }

        self.transition(appointment, Role::Dentist, new_status).await
    }

    pub async fn get_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.find(appointment_id).await?;

        let visible = actor.is_admin()
            || actor.is_patient(appointment.patient_id)
            || actor.is_dentist(appointment.dentist_id);
        if !visible {
            return Err(AppointmentError::Forbidden(
                "Not authorized to view this appointment".to_string(),
            ));
        }

        Ok(appointment)
    }

    pub async fn list_for_patient(
        &self,
        actor: &Actor,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !(actor.is_patient(patient_id) || actor.is_admin()) {
            return Err(AppointmentError::Forbidden(
                "Not authorized to view this patient's appointments".to_string(),
            ));
        }

        self.repository.list_for_patient(patient_id).await
    }

    pub async fn list_for_dentist(
        &self,
        actor: &Actor,
        dentist_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Self::ensure_dentist_view(actor, dentist_id)?;
        self.repository.list_for_dentist(dentist_id).await
    }

    /// Every appointment on `date`, cancelled ones included.
    pub async fn dentist_schedule(
        &self,
        actor: &Actor,
        dentist_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Self::ensure_dentist_view(actor, dentist_id)?;
        self.repository.list_for_dentist_on(dentist_id, date).await
    }

    pub async fn dentist_day(
        &self,
        actor: &Actor,
        dentist_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self.dentist_schedule(actor, dentist_id, date).await?;
        appointments.retain(|a| a.status.blocks_slot());
        Ok(appointments)
    }

    pub async fn dentist_upcoming(
        &self,
        actor: &Actor,
        dentist_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Self::ensure_dentist_view(actor, dentist_id)?;

        let to = from
            .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
            .ok_or_else(|| AppointmentError::ValidationError(format!(
                "from date {} is too far in the future", from
            )))?;
        let mut appointments = self.repository
            .list_for_dentist_between(dentist_id, from, to)
            .await?;
        appointments.retain(|a| a.status.blocks_slot());
        Ok(appointments)
    }

    /// Read-only overlap check for a prospective slot. Nothing is reserved.
    pub async fn check_slot(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        if start_time >= end_time {
            return Err(AppointmentError::ValidationError(
                "start_time must be before end_time".to_string(),
            ));
        }

        self.conflict_service
            .check_conflicts(dentist_id, date, start_time, end_time)
            .await
    }

    /// Soft-deletes a service. Appointments that reference it are left as they are.
    pub async fn deactivate_service(
        &self,
        actor: &Actor,
        service_id: Uuid,
    ) -> Result<DentalService, AppointmentError> {
        Ok(self.catalog.deactivate_service(actor, service_id).await?)
    }

    async fn bookable_service(&self, service_id: Uuid) -> Result<DentalService, AppointmentError> {
        let service = self.catalog.get_service(service_id).await?;

        if !service.is_active {
            if !self.policy.allow_inactive_services {
                debug!("Service {} is inactive; refusing booking", service_id);
                return Err(AppointmentError::ServiceNotFound);
            }
            warn!("Booking inactive service {} under lax policy", service_id);
        }

        Ok(service)
    }

    async fn find(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.repository.get(appointment_id).await?
            .ok_or(AppointmentError::NotFound)
    }

    async fn transition(
        &self,
        appointment: Appointment,
        role: Role,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle_service
            .validate_status_transition(role, appointment.status, new_status)?;

        let previous = appointment.status;
        let expected_version = appointment.version;
        let changed = Appointment {
            status: new_status,
            updated_at: Some(Utc::now()),
            ..appointment
        };

        let updated = self.repository.update_if_version(changed, expected_version).await?;
        info!("Appointment {} moved {} -> {} by {}", updated.id, previous, new_status, role);
        Ok(updated)
    }

    fn ensure_dentist_view(actor: &Actor, dentist_id: Uuid) -> Result<(), AppointmentError> {
        if actor.is_dentist(dentist_id) || actor.is_admin() {
            Ok(())
        } else {
            Err(AppointmentError::Forbidden(
                "Not authorized to view this dentist's appointments".to_string(),
            ))
        }
    }
}

// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::auth::Role;

use crate::models::{AppointmentError, AppointmentStatus};

#[derive(Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that `role` may move an appointment from `current_status` to `new_status`.
    pub fn validate_status_transition(
        &self,
        role: Role,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating {} transition from {} to {}", role, current_status, new_status);

        if !self.get_valid_transitions(role, current_status).contains(&new_status) {
            warn!("Invalid status transition attempted by {}: {} -> {}", role, current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Statuses `role` may move an appointment to from `current_status`.
    pub fn get_valid_transitions(
        &self,
        role: Role,
        current_status: AppointmentStatus,
    ) -> Vec<AppointmentStatus> {
        use crate::models::AppointmentStatus::*;

        match (role, current_status) {
            (Role::Patient, Pending) | (Role::Patient, Confirmed) => vec![Cancelled],
            (Role::Dentist, Pending) => vec![Confirmed, Cancelled],
            (Role::Dentist, Confirmed) => vec![Completed, NoShow, Cancelled],
            // Terminal states, and admins never drive the lifecycle.
            _ => vec![],
        }
    }
}

// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use shared_models::error::ApiError;

use crate::models::AppointmentStatus;

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), ApiError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(ApiError::InvalidTransition {
                from: current_status.label().to_string(),
                to: new_status.label().to_string(),
            });
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => {
                vec![AppointmentStatus::Completed, AppointmentStatus::Canceled]
            }
            // Terminal states
            AppointmentStatus::Completed | AppointmentStatus::Canceled => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::NaiveDate;
use tracing::debug;

use shared_models::error::ApiError;

use crate::models::{Appointment, AppointmentBatch, AppointmentStatus, AppointmentUpdate, QuarantinedRecord};
use crate::services::bucketing::{self, AppointmentBuckets, AppointmentCounts};
use crate::services::filtering::{self, AppointmentFilter, SortKey, SortState};
use crate::services::lifecycle::AppointmentLifecycleService;

/// In-memory state behind one appointment view: the loaded set plus the
/// filter and sort the admin picked. Records are only patched after the
/// backend confirmed a change.
#[derive(Debug, Clone, Default)]
pub struct AppointmentBoard {
    appointments: Vec<Appointment>,
    quarantined: Vec<QuarantinedRecord>,
    filter: AppointmentFilter,
    sort: SortState,
}

impl AppointmentBoard {
    pub fn new(batch: AppointmentBatch) -> Self {
        let mut board = Self::default();
        board.load(batch);
        board
    }

    /// Replaces the loaded set. Filter and sort survive a reload.
    pub fn load(&mut self, batch: AppointmentBatch) {
        debug!(
            "Loading {} appointments ({} quarantined)",
            batch.appointments.len(),
            batch.quarantined.len()
        );
        self.appointments = batch.appointments;
        self.quarantined = batch.quarantined;
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn quarantined(&self) -> &[QuarantinedRecord] {
        &self.quarantined
    }

    /// Board over a single record, for operations that fetched just one.
    pub fn from_appointment(appointment: Appointment) -> Self {
        Self {
            appointments: vec![appointment],
            ..Self::default()
        }
    }

    /// Removes the record and hands it back.
    pub fn take(&mut self, id: &str) -> Result<Appointment, ApiError> {
        self.remove(id)
            .ok_or_else(|| ApiError::NotFound(format!("Appointment {} not loaded", id)))
    }

    pub fn get(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn filter(&self) -> &AppointmentFilter {
        &self.filter
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn set_filter(&mut self, filter: AppointmentFilter) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    pub fn reset_filters(&mut self) {
        self.filter = AppointmentFilter::default();
    }

    pub fn change_sort(&mut self, key: SortKey) {
        self.sort.select(key);
    }

    pub fn view(&self) -> Vec<Appointment> {
        filtering::apply(&self.appointments, &self.filter, self.sort)
    }

    pub fn buckets(&self, today: NaiveDate) -> AppointmentBuckets {
        bucketing::partition(&self.appointments, today)
    }

    pub fn counts(&self) -> AppointmentCounts {
        AppointmentCounts::tally(&self.appointments)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Appointment, ApiError> {
        self.appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Appointment {} not loaded", id)))
    }

    pub fn confirm_status(&mut self, id: &str, status: AppointmentStatus) -> Result<(), ApiError> {
        let appointment = self.find_mut(id)?;
        AppointmentLifecycleService::new().validate_status_transition(appointment.status, status)?;
        appointment.status = status;
        Ok(())
    }

    pub fn confirm_update(&mut self, id: &str, update: &AppointmentUpdate) -> Result<(), ApiError> {
        self.find_mut(id)?.apply_update(update)
    }

    pub fn remove(&mut self, id: &str) -> Option<Appointment> {
        let index = self.appointments.iter().position(|a| a.id == id)?;
        Some(self.appointments.remove(index))
    }
}

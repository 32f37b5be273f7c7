// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use shared_config::InvalidDatePolicy;
use shared_models::error::ApiError;

use crate::services::date;

// ==============================================================================
// STATUS & ORIGIN
// ==============================================================================

/// Service labels offered by the clinic. `serviceType` stays free text on the
/// wire; this list is what the forms offer.
pub const SERVICE_TYPES: [&str; 7] = [
    "Vacinação",
    "Castração",
    "Check up inicial",
    "Exames",
    "Medicação",
    "Consulta",
    "Banho e tosa",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "canceled" | "cancelled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduled => "Agendado",
            Self::Completed => "Concluído",
            Self::Canceled => "Cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentOrigin {
    Automatic,
    Manual,
}

impl AppointmentOrigin {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "automatic" => Some(Self::Automatic),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    /// Vaccinations and initial check-ups are booked by the system.
    pub fn infer(service_type: &str) -> Self {
        let normalized = service_type.trim().to_lowercase().replace('-', " ");
        match normalized.as_str() {
            "vacinação" | "check up inicial" => Self::Automatic,
            _ => Self::Manual,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Automatic => "Automático",
            Self::Manual => "Manual",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic-event",
            Self::Manual => "manual-event",
        }
    }
}

// ==============================================================================
// WIRE RECORD & VALIDATED RECORD
// ==============================================================================

/// An appointment exactly as the schedule service sends it. Everything is
/// optional and ids may come as numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppointment {
    pub id: Option<Value>,
    pub pet_id: Option<Value>,
    pub pet_name: Option<String>,
    pub service_type: Option<String>,
    pub date: Option<String>,
    #[serde(alias = "hour")]
    pub time: Option<String>,
    pub status: Option<String>,
    pub origin: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}

fn id_to_string(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuarantineReason {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("invalid time '{0}'")]
    InvalidTime(String),
}

impl From<QuarantineReason> for ApiError {
    fn from(reason: QuarantineReason) -> Self {
        match reason {
            QuarantineReason::InvalidDate(v) => ApiError::InvalidDate(v),
            QuarantineReason::InvalidTime(v) => ApiError::InvalidTime(v),
            other => ApiError::Decode(other.to_string()),
        }
    }
}

/// A record left out of the views because it could not be validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantinedRecord {
    pub id: Option<String>,
    pub reason: String,
}

/// A validated appointment. `date_obj` and `formatted_date` are derived from
/// `date` and `time` once, at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub pet_id: String,
    pub pet_name: String,
    pub service_type: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub origin: AppointmentOrigin,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub date_obj: NaiveDateTime,
    pub formatted_date: String,
}

impl Appointment {
    pub fn from_raw(
        raw: RawAppointment,
        policy: InvalidDatePolicy,
        now: NaiveDateTime,
    ) -> Result<Self, QuarantineReason> {
        let id = id_to_string(&raw.id).ok_or(QuarantineReason::MissingField("id"))?;

        let status = match raw.status.as_deref() {
            None | Some("") => AppointmentStatus::Scheduled,
            Some(s) => AppointmentStatus::parse(s)
                .ok_or_else(|| QuarantineReason::UnknownStatus(s.to_string()))?,
        };

        let service_type = raw.service_type.unwrap_or_default();
        let origin = raw
            .origin
            .as_deref()
            .and_then(AppointmentOrigin::parse)
            .unwrap_or_else(|| AppointmentOrigin::infer(&service_type));

        let date_text = raw.date.unwrap_or_default();
        let time = canonical_time(raw.time.unwrap_or_default());

        let date_obj = match Self::derive_instant(&date_text, &time) {
            Ok(instant) => instant,
            Err(reason) => match policy {
                InvalidDatePolicy::Quarantine => return Err(reason),
                InvalidDatePolicy::SubstituteNow => {
                    warn!("Appointment {} has {}, using current time instead", id, reason);
                    now
                }
            },
        };

        Ok(Self {
            id,
            pet_id: id_to_string(&raw.pet_id).unwrap_or_default(),
            pet_name: raw.pet_name.unwrap_or_default(),
            service_type,
            date: date_text,
            time,
            status,
            origin,
            owner_name: raw.owner_name,
            owner_email: raw.owner_email,
            formatted_date: date::format_day(date_obj.date()),
            date_obj,
        })
    }

    fn derive_instant(date_text: &str, time: &str) -> Result<NaiveDateTime, QuarantineReason> {
        let time = if time.trim().is_empty() { None } else { Some(time) };
        date::normalize(date::DateInput::Text(date_text), time).map_err(|e| match e {
            ApiError::InvalidTime(t) => QuarantineReason::InvalidTime(t),
            _ => QuarantineReason::InvalidDate(date_text.to_string()),
        })
    }

    /// Applies a change the server has confirmed and re-derives the instant.
    pub fn apply_update(&mut self, update: &AppointmentUpdate) -> Result<(), ApiError> {
        let date_text = update.date.clone().unwrap_or_else(|| self.date.clone());
        let time = canonical_time(update.time.clone().unwrap_or_else(|| self.time.clone()));
        let date_obj = Self::derive_instant(&date_text, &time)?;

        if let Some(service_type) = &update.service_type {
            self.service_type = service_type.clone();
        }
        self.date = date_text;
        self.time = time;
        self.date_obj = date_obj;
        self.formatted_date = date::format_day(date_obj.date());
        Ok(())
    }
}

// `9:00` and `09:00:30` both become `09:00`; unparseable text is kept for
// the instant derivation to reject.
fn canonical_time(time: String) -> String {
    match date::parse_time(&time) {
        Ok(parsed) => date::format_time(parsed),
        Err(_) => time,
    }
}

/// Result of validating a whole listing at the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentBatch {
    pub appointments: Vec<Appointment>,
    pub quarantined: Vec<QuarantinedRecord>,
}

impl AppointmentBatch {
    pub fn from_raw(
        records: Vec<RawAppointment>,
        policy: InvalidDatePolicy,
        now: NaiveDateTime,
    ) -> Self {
        let mut batch = Self::default();

        for raw in records {
            let id = id_to_string(&raw.id);
            match Appointment::from_raw(raw, policy, now) {
                Ok(appointment) => batch.appointments.push(appointment),
                Err(reason) => {
                    warn!("Quarantining appointment {:?}: {}", id, reason);
                    batch.quarantined.push(QuarantinedRecord {
                        id,
                        reason: reason.to_string(),
                    });
                }
            }
        }

        batch
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub pet_id: String,
    pub pet_name: Option<String>,
    pub service_type: String,
    pub date: String,
    pub time: String,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}

/// Partial update: only the fields that are present are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_type: Option<String>,
}

impl AppointmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.time.is_none() && self.service_type.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub appointment_id: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<String>,
    pub date: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn raw(value: Value) -> RawAppointment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn origin_is_inferred_from_service_type() {
        assert_eq!(AppointmentOrigin::infer("Vacinação"), AppointmentOrigin::Automatic);
        assert_eq!(AppointmentOrigin::infer("Check-up Inicial"), AppointmentOrigin::Automatic);
        assert_eq!(AppointmentOrigin::infer("Check up inicial"), AppointmentOrigin::Automatic);
        assert_eq!(AppointmentOrigin::infer("Banho e tosa"), AppointmentOrigin::Manual);
    }

    #[test]
    fn explicit_origin_wins_and_bogus_origin_is_inferred() {
        let a = Appointment::from_raw(
            raw(json!({"id": 7, "serviceType": "Vacinação", "date": "15/05/2024", "origin": "manual"})),
            InvalidDatePolicy::Quarantine,
            now(),
        )
        .unwrap();
        assert_eq!(a.id, "7");
        assert_eq!(a.origin, AppointmentOrigin::Manual);

        let b = Appointment::from_raw(
            raw(json!({"id": "b", "serviceType": "Vacinação", "date": "15/05/2024", "origin": "robot"})),
            InvalidDatePolicy::Quarantine,
            now(),
        )
        .unwrap();
        assert_eq!(b.origin, AppointmentOrigin::Automatic);
    }

    #[test]
    fn derived_fields_leave_source_fields_alone() {
        let a = Appointment::from_raw(
            raw(json!({"id": "a", "date": "2024-05-20", "hour": "14:30", "status": "scheduled"})),
            InvalidDatePolicy::Quarantine,
            now(),
        )
        .unwrap();
        assert_eq!(a.date, "2024-05-20");
        assert_eq!(a.time, "14:30");
        assert_eq!(a.formatted_date, "20/05/2024");
        assert_eq!(a.date_obj.to_string(), "2024-05-20 14:30:00");
    }

    #[test]
    fn missing_status_defaults_to_scheduled_unknown_is_rejected() {
        let a = Appointment::from_raw(
            raw(json!({"id": "a", "date": "15/05/2024"})),
            InvalidDatePolicy::Quarantine,
            now(),
        )
        .unwrap();
        assert_eq!(a.status, AppointmentStatus::Scheduled);

        let err = Appointment::from_raw(
            raw(json!({"id": "a", "date": "15/05/2024", "status": "lost"})),
            InvalidDatePolicy::Quarantine,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, QuarantineReason::UnknownStatus("lost".into()));
    }

    #[test]
    fn invalid_dates_follow_policy() {
        let bad = json!({"id": "a", "date": "someday", "time": "10:00"});

        let err = Appointment::from_raw(raw(bad.clone()), InvalidDatePolicy::Quarantine, now())
            .unwrap_err();
        assert_eq!(err, QuarantineReason::InvalidDate("someday".into()));

        let a = Appointment::from_raw(raw(bad), InvalidDatePolicy::SubstituteNow, now()).unwrap();
        assert_eq!(a.date_obj, now());
        assert_eq!(a.date, "someday");
    }

    #[test]
    fn batch_keeps_good_records_and_reports_bad_ones() {
        let records = vec![
            raw(json!({"id": "1", "date": "15/05/2024", "time": "09:00"})),
            raw(json!({"date": "15/05/2024"})),
            raw(json!({"id": "3", "date": "31/02/2024"})),
            raw(json!({"id": "4", "date": "15/05/2024", "time": "25:00"})),
        ];
        let batch = AppointmentBatch::from_raw(records, InvalidDatePolicy::Quarantine, now());

        assert_eq!(batch.appointments.len(), 1);
        assert_eq!(batch.quarantined.len(), 3);
        assert_eq!(batch.quarantined[0].id, None);
        assert_eq!(batch.quarantined[1].id.as_deref(), Some("3"));
        assert_eq!(batch.quarantined[2].reason, "invalid time '25:00'");
    }

    #[test]
    fn confirmed_update_rederives_instant() {
        let mut a = Appointment::from_raw(
            raw(json!({"id": "a", "date": "15/05/2024", "time": "09:00", "serviceType": "Consulta"})),
            InvalidDatePolicy::Quarantine,
            now(),
        )
        .unwrap();

        a.apply_update(&AppointmentUpdate {
            date: Some("17/05/2024".into()),
            time: None,
            service_type: Some("Exames".into()),
        })
        .unwrap();

        assert_eq!(a.service_type, "Exames");
        assert_eq!(a.formatted_date, "17/05/2024");
        assert_eq!(a.date_obj.to_string(), "2024-05-17 09:00:00");
    }
}

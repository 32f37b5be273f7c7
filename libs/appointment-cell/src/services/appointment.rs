// libs/appointment-cell/src/services/appointment.rs
use chrono::{Local, NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use shared_backend::{AuthPolicy, BackendClient};
use shared_config::{AppConfig, InvalidDatePolicy};
use shared_models::auth::Session;
use shared_models::error::ApiError;

use crate::models::{
    Appointment, AppointmentBatch, AppointmentStatus, AppointmentUpdate, CreateAppointmentRequest,
    RawAppointment, StatusUpdateRequest,
};
use crate::services::board::AppointmentBoard;
use crate::services::date;
use crate::services::lifecycle::AppointmentLifecycleService;

const BASE_PATH: &str = "/Schedule/appointment";

pub struct AppointmentService {
    backend: BackendClient,
    lifecycle_service: AppointmentLifecycleService,
    invalid_date_policy: InvalidDatePolicy,
}

fn item_path(id: &str) -> String {
    format!("{}/{}", BASE_PATH, urlencoding::encode(id))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Checks a booking and returns the wire body the schedule service expects:
/// the day as `dd/MM/yyyy` and the time under `hour`.
pub fn build_create_body(request: &CreateAppointmentRequest, today: NaiveDate) -> Result<Value, ApiError> {
    let mut problems = Vec::new();

    if request.pet_id.trim().is_empty() {
        problems.push("petId é obrigatório".to_string());
    }
    if request.service_type.trim().is_empty() {
        problems.push("serviceType é obrigatório".to_string());
    }

    let day = if request.date.trim().is_empty() {
        problems.push("date é obrigatório".to_string());
        None
    } else {
        match date::parse_day(&request.date) {
            Ok(day) if day < today => {
                problems.push("A data não pode estar no passado".to_string());
                None
            }
            Ok(day) => Some(day),
            Err(e) => {
                problems.push(e.user_message());
                None
            }
        }
    };

    let time = if request.time.trim().is_empty() {
        problems.push("time é obrigatório".to_string());
        None
    } else {
        match date::parse_time(&request.time) {
            Ok(t) => Some(t),
            Err(e) => {
                problems.push(e.user_message());
                None
            }
        }
    };

    match (day, time) {
        (Some(day), Some(time)) if problems.is_empty() => Ok(json!({
            "petId": request.pet_id.trim(),
            "petName": request.pet_name.clone().unwrap_or_default(),
            "serviceType": request.service_type.trim(),
            "date": date::format_day(day),
            "hour": date::format_time(time),
            "ownerName": request.owner_name.clone().unwrap_or_default(),
            "ownerEmail": request.owner_email.clone().unwrap_or_default(),
        })),
        _ => Err(ApiError::Validation(problems.join("; "))),
    }
}

/// Only the fields present in the update make it into the body. Dates are
/// re-formatted as `dd/MM/yyyy`.
pub fn build_update_body(update: &AppointmentUpdate) -> Result<Map<String, Value>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::Validation("Nenhum campo para atualizar".to_string()));
    }

    let mut body = Map::new();

    if let Some(service_type) = update.service_type.as_deref().map(str::trim) {
        if service_type.is_empty() {
            return Err(ApiError::Validation("serviceType não pode ser vazio".to_string()));
        }
        body.insert("serviceType".to_string(), json!(service_type));
    }

    if let Some(time) = &update.time {
        let parsed = date::parse_time(time)?;
        body.insert("time".to_string(), json!(date::format_time(parsed)));
    }

    if let Some(day) = &update.date {
        let parsed = date::parse_day(day)?;
        body.insert("date".to_string(), json!(date::format_day(parsed)));
    }

    Ok(body)
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::schedule(config),
            lifecycle_service: AppointmentLifecycleService::new(),
            invalid_date_policy: config.invalid_date_policy,
        }
    }

    pub async fn list(&self, session: Option<&Session>) -> Result<AppointmentBatch, ApiError> {
        debug!("Fetching all appointments");
        let raws: Vec<RawAppointment> = self
            .backend
            .request(Method::GET, BASE_PATH, session, AuthPolicy::Optional, None)
            .await?;

        Ok(AppointmentBatch::from_raw(raws, self.invalid_date_policy, now()))
    }

    pub async fn list_for_pet(
        &self,
        pet_id: &str,
        session: Option<&Session>,
    ) -> Result<AppointmentBatch, ApiError> {
        debug!("Fetching appointments for pet {}", pet_id);
        let path = format!("{}/pet/{}", BASE_PATH, urlencoding::encode(pet_id));
        let raws: Vec<RawAppointment> = self
            .backend
            .request(Method::GET, &path, session, AuthPolicy::Optional, None)
            .await?;

        Ok(AppointmentBatch::from_raw(raws, self.invalid_date_policy, now()))
    }

    pub async fn get(&self, id: &str, session: Option<&Session>) -> Result<Appointment, ApiError> {
        let raw: RawAppointment = self
            .backend
            .request(Method::GET, &item_path(id), session, AuthPolicy::Optional, None)
            .await?;

        Appointment::from_raw(raw, self.invalid_date_policy, now()).map_err(|reason| {
            warn!("Appointment {} failed validation: {}", id, reason);
            ApiError::from(reason)
        })
    }

    pub async fn create(
        &self,
        request: &CreateAppointmentRequest,
        session: Option<&Session>,
    ) -> Result<Value, ApiError> {
        let body = build_create_body(request, now().date())?;
        info!("Creating appointment for pet {}", request.pet_id);

        self.backend
            .request_value(Method::POST, BASE_PATH, session, AuthPolicy::Optional, Some(body))
            .await
    }

    /// PATCH with only the changed fields. Backends that refuse PATCH get the
    /// merged record through PUT on the collection. Returns the record with
    /// the confirmed change applied.
    pub async fn update_partial(
        &self,
        id: &str,
        update: &AppointmentUpdate,
        session: Option<&Session>,
    ) -> Result<Appointment, ApiError> {
        let body = build_update_body(update)?;

        let current = match self
            .backend
            .request_value(Method::GET, &item_path(id), session, AuthPolicy::Optional, None)
            .await?
        {
            Value::Object(map) => map,
            _ => return Err(ApiError::Decode(format!("Appointment {} is not an object", id))),
        };

        debug!("Sending PATCH for appointment {}: {:?}", id, body);
        let result = self
            .backend
            .request_value(
                Method::PATCH,
                &item_path(id),
                session,
                AuthPolicy::Optional,
                Some(Value::Object(body.clone())),
            )
            .await;

        let mut merged = current.clone();
        merged.extend(body);

        match result {
            Err(ApiError::MethodNotAllowed(_)) => {
                warn!("PATCH not allowed for appointment {}, falling back to PUT", id);
                self.backend
                    .request_value(
                        Method::PUT,
                        BASE_PATH,
                        session,
                        AuthPolicy::Optional,
                        Some(Value::Object(merged.clone())),
                    )
                    .await?;
            }
            other => {
                other?;
            }
        }
        info!("Appointment {} updated", id);

        match self.normalize(Value::Object(current)) {
            Ok(appointment) => {
                let mut board = AppointmentBoard::from_appointment(appointment);
                board.confirm_update(id, update)?;
                board.take(id)
            }
            // A record that failed validation before may be fixed by the update.
            Err(reason) => {
                debug!("Stored appointment {} was invalid ({}), reading the merged record", id, reason);
                self.normalize(Value::Object(merged))
            }
        }
    }

    fn normalize(&self, record: Value) -> Result<Appointment, ApiError> {
        let raw: RawAppointment =
            serde_json::from_value(record).map_err(|e| ApiError::Decode(e.to_string()))?;
        Appointment::from_raw(raw, self.invalid_date_policy, now()).map_err(ApiError::from)
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        session: Option<&Session>,
    ) -> Result<Value, ApiError> {
        let body = StatusUpdateRequest {
            appointment_id: id.to_string(),
            status,
        };
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;

        self.backend
            .request_value(
                Method::PUT,
                &format!("{}/status", BASE_PATH),
                session,
                AuthPolicy::Optional,
                Some(body),
            )
            .await
    }

    /// Loads the current record, rejects illegal transitions locally and
    /// returns the record patched with the status the server accepted.
    pub async fn transition(
        &self,
        id: &str,
        status: AppointmentStatus,
        session: Option<&Session>,
    ) -> Result<Appointment, ApiError> {
        let appointment = self.get(id, session).await?;
        self.lifecycle_service
            .validate_status_transition(appointment.status, status)?;

        self.update_status(id, status, session).await?;
        info!("Appointment {} is now {}", id, status);

        let mut board = AppointmentBoard::from_appointment(appointment);
        board.confirm_status(id, status)?;
        board.take(id)
    }

    pub async fn delete(&self, id: &str, session: Option<&Session>) -> Result<(), ApiError> {
        self.backend
            .request_value(Method::DELETE, &item_path(id), session, AuthPolicy::Optional, None)
            .await?;
        info!("Appointment {} deleted", id);
        Ok(())
    }
}

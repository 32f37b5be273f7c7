// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Local;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentListQuery, AppointmentStatus, AppointmentUpdate,
    CreateAppointmentRequest,
};
use crate::services::appointment::AppointmentService;
use crate::services::board::AppointmentBoard;
use crate::services::{calendar, date, filtering};

fn with_badges(appointments: &[Appointment]) -> Vec<Value> {
    appointments
        .iter()
        .map(|a| {
            let day = a.date_obj.date();
            json!({
                "appointment": a,
                "dayBadge": date::day_badge(day),
                "monthBadge": date::month_badge(day),
            })
        })
        .collect()
}

async fn load_board(
    state: &AppConfig,
    session: &Session,
    query: &AppointmentListQuery,
) -> Result<AppointmentBoard, AppError> {
    let (filter, sort) = filtering::from_query(query)?;

    let service = AppointmentService::new(state);
    let mut board = AppointmentBoard::new(service.list(Some(session)).await?);
    board.set_filter(filter);
    board.set_sort(sort);
    Ok(board)
}

// ==============================================================================
// VIEWS
// ==============================================================================

/// Dashboard: today/upcoming/past groups, status counts and the filtered list.
#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let board = load_board(&state, &session, &query).await?;
    let buckets = board.buckets(Local::now().date_naive());

    Ok(Json(json!({
        "today": with_badges(&buckets.today),
        "upcoming": with_badges(&buckets.upcoming),
        "past": with_badges(&buckets.past),
        "counts": buckets.counts,
        "appointments": board.view(),
        "sort": board.sort_state(),
        "quarantined": board.quarantined(),
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let board = load_board(&state, &session, &query).await?;
    let view = board.view();

    Ok(Json(json!({
        "total": view.len(),
        "appointments": view,
        "sort": board.sort_state(),
        "quarantined": board.quarantined(),
    })))
}

#[axum::debug_handler]
pub async fn get_calendar(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let batch = AppointmentService::new(&state).list(Some(&session)).await?;

    Ok(Json(json!({
        "events": calendar::events(&batch.appointments),
        "quarantined": batch.quarantined,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&state)
        .get(&appointment_id, Some(&session))
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_pet_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut batch = AppointmentService::new(&state)
        .list_for_pet(&pet_id, Some(&session))
        .await?;
    filtering::sort(&mut batch.appointments, filtering::SortState::default());

    Ok(Json(json!({
        "pet_id": pet_id,
        "total": batch.appointments.len(),
        "appointments": batch.appointments,
        "quarantined": batch.quarantined,
    })))
}

// ==============================================================================
// WRITES
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let created = AppointmentService::new(&state)
        .create(&request, Some(&session))
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": created,
        "message": "Agendamento criado com sucesso"
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<String>,
    Json(update): Json<AppointmentUpdate>,
) -> Result<Json<Value>, AppError> {
    let updated = AppointmentService::new(&state)
        .update_partial(&appointment_id, &update, Some(&session))
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated,
        "message": "Agendamento atualizado com sucesso"
    })))
}

async fn transition(
    state: &AppConfig,
    session: &Session,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(state)
        .transition(appointment_id, status, Some(session))
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Agendamento marcado como {}", status.label())
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &session, &appointment_id, AppointmentStatus::Completed).await
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &session, &appointment_id, AppointmentStatus::Canceled).await
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    AppointmentService::new(&state)
        .delete(&appointment_id, Some(&session))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Agendamento excluído com sucesso"
    })))
}

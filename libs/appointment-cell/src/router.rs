// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, session_middleware};

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    let admin_routes = Router::new()
        .route("/calendar", get(handlers::get_calendar))
        .layer(middleware::from_fn(admin_middleware));

    // Every appointment operation requires a session
    let protected_routes = Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::create_appointment))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/pet/{pet_id}", get(handlers::get_pet_appointments))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .patch(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

use std::sync::Arc;

use axum::{handler::Handler, middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, session_middleware};

use crate::handlers::*;

pub fn create_pet_router(config: Arc<AppConfig>) -> Router {
    let public_routes = Router::new().route("/breeds", get(get_breeds));

    // Registration is admin-only, the rest needs any session
    let protected_routes = Router::new()
        .route(
            "/",
            get(list_pets).post(register_pet.layer(middleware::from_fn(admin_middleware))),
        )
        .route("/{id}", get(get_pet).put(update_pet).delete(delete_pet))
        .layer(middleware::from_fn_with_state(config.clone(), session_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(config)
}

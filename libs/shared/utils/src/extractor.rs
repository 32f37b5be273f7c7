use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::{ApiError, AppError};

use crate::jwt::session_from_token;

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or(AppError::Backend(ApiError::NotAuthenticated))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    match auth_value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
    }
}

// Puts the caller's Session into the request extensions.
pub async fn session_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;
    let session = session_from_token(&token, config.jwt_secret.as_deref())?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

// Must run after session_middleware.
pub async fn admin_middleware(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let session = extract_session(&request)?;

    if !session.is_admin() {
        return Err(AppError::Forbidden(
            "Acesso restrito a administradores.".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

pub fn extract_session<B>(request: &Request<B>) -> Result<Session, AppError> {
    request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or(AppError::Backend(ApiError::NotAuthenticated))
}

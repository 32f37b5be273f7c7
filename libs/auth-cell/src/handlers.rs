use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::SessionResponse;
use shared_models::error::{ApiError, AppError};
use shared_utils::jwt::session_from_token;

use crate::models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::services::AuthService;

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = AuthService::new(&config)
        .login(&request)
        .await
        .map_err(|e| match e {
            ApiError::Unauthorized(_) => AppError::Auth("Usuário ou senha inválidos".to_string()),
            other => AppError::Backend(other),
        })?;

    Ok(Json(LoginResponse {
        token: session.token.clone(),
        session: SessionResponse::from(&session),
    }))
}

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let result = AuthService::new(&config).register(&request).await?;

    Ok(Json(json!({
        "success": true,
        "result": result,
        "message": "Usuário registrado com sucesso"
    })))
}

/// Decodes the caller's token. No backend call is made.
#[axum::debug_handler]
pub async fn get_session(
    State(config): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<SessionResponse>, AppError> {
    let TypedHeader(auth) = auth.ok_or(AppError::Backend(ApiError::NotAuthenticated))?;
    debug!("Resolving session from bearer token");

    let session = session_from_token(auth.token(), config.jwt_secret.as_deref())?;
    Ok(Json(SessionResponse::from(&session)))
}

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_backend::{AuthPolicy, BackendClient};
use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::ApiError;
use shared_utils::jwt::session_from_token;

use crate::models::{LoginRequest, RegisterRequest, TokenResponse};

/// Login and registration live on the pets service.
pub struct AuthService {
    backend: BackendClient,
    jwt_secret: Option<String>,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::pets(config),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Exchanges credentials for a token and decodes it into a session.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        request.validate()?;
        debug!("Attempting login for user {}", request.username);

        let response: TokenResponse = self
            .backend
            .request(
                Method::POST,
                "/api/Auth/login",
                None,
                AuthPolicy::Anonymous,
                Some(json!({
                    "username": request.username,
                    "password": request.password
                })),
            )
            .await?;

        let token = response.token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            warn!("Login for {} succeeded without a token", request.username);
            ApiError::Decode("missing token".to_string())
        })?;

        let session = session_from_token(&token, self.jwt_secret.as_deref())?;
        info!("User {} logged in", request.username);
        Ok(session)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, ApiError> {
        request.validate()?;
        debug!("Registering user {} with role {}", request.username, request.role);

        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.backend
            .request_value(
                Method::POST,
                "/api/Auth/register",
                None,
                AuthPolicy::Anonymous,
                Some(body),
            )
            .await
    }
}

use serde::{Deserialize, Serialize};

use shared_models::auth::{SessionResponse, ADMIN_ROLE};
use shared_models::error::ApiError;

pub const MIN_USERNAME_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::Validation(
                "Usuário e senha são obrigatórios".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();

        if self.username.trim().chars().count() < MIN_USERNAME_LEN {
            problems.push(format!(
                "Usuário deve ter pelo menos {} caracteres",
                MIN_USERNAME_LEN
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            problems.push(format!(
                "Senha deve ter pelo menos {} caracteres",
                MIN_PASSWORD_LEN
            ));
        }
        if self.password != self.confirm_password {
            problems.push("As senhas não coincidem".to_string());
        }
        if !matches!(self.role.as_str(), "user" | ADMIN_ROLE) {
            problems.push("Perfil deve ser 'user' ou 'admin'".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(problems.join("; ")))
        }
    }
}

/// What the auth service answers on a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub session: SessionResponse,
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures talking to the clinic backend, plus the client-side checks that
/// stop a request before it is sent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected status {status}: {message}")]
    Unexpected { status: u16, message: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classifies a non-success backend status. `body` is the raw response
    /// text; a JSON `message` field inside it is preferred when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            0 => ApiError::Network(message),
            400 => ApiError::Validation(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            405 => ApiError::MethodNotAllowed(message),
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Unexpected { status, message },
        }
    }

    /// Only connectivity and server faults are worth a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Network(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unauthorized(_) | ApiError::NotAuthenticated | ApiError::SessionExpired => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::InvalidDate(_) | ApiError::InvalidTime(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ApiError::Server { .. } | ApiError::Unexpected { .. } | ApiError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// Localized text shown in the admin's error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Não foi possível conectar ao servidor. Verifique se o backend está rodando.".to_string()
            }
            ApiError::Unauthorized(_) => "Não autorizado. Sua sessão pode ter expirado.".to_string(),
            ApiError::Forbidden(_) => {
                "Acesso proibido. Sua conta não tem permissão para realizar esta operação.".to_string()
            }
            ApiError::NotFound(_) => "Recurso não encontrado.".to_string(),
            ApiError::Validation(msg) if msg.is_empty() => {
                "Dados inválidos: Verifique os campos e tente novamente.".to_string()
            }
            ApiError::Validation(msg) => format!("Dados inválidos: {}", msg),
            ApiError::MethodNotAllowed(_) => {
                "Método HTTP não permitido. Verifique se a API suporta este tipo de operação.".to_string()
            }
            ApiError::Server { .. } => {
                "Erro interno do servidor. Por favor, tente novamente mais tarde.".to_string()
            }
            ApiError::Unexpected { status, message } => {
                let message = if message.is_empty() { "Erro desconhecido" } else { message };
                format!("Código: {}, Mensagem: {}", status, message)
            }
            ApiError::NotAuthenticated => "Não autenticado. Faça login novamente.".to_string(),
            ApiError::SessionExpired => "Sessão expirada. Faça login novamente.".to_string(),
            ApiError::InvalidDate(value) => format!("Data inválida: {}", value),
            ApiError::InvalidTime(value) => format!("Horário inválido: {}", value),
            ApiError::InvalidTransition { from, to } => {
                format!("Não é possível alterar o status de '{}' para '{}'.", from, to)
            }
            ApiError::Decode(_) => "Resposta inesperada do servidor.".to_string(),
        }
    }
}

fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error", "title"] {
            if let Some(msg) = value.get(key).and_then(|m| m.as_str()) {
                return msg.to_string();
            }
        }
    }
    trimmed.to_string()
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Backend(#[from] ApiError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Backend(err) => (err.status_code(), err.user_message()),
        };

        tracing::error!("Error: {}: {}", status, self);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_taxonomy() {
        assert_eq!(ApiError::from_status(0, ""), ApiError::Network(String::new()));
        assert!(matches!(ApiError::from_status(400, r#"{"message":"petId"}"#), ApiError::Validation(m) if m == "petId"));
        assert!(matches!(ApiError::from_status(401, ""), ApiError::Unauthorized(_)));
        assert!(matches!(ApiError::from_status(403, ""), ApiError::Forbidden(_)));
        assert!(matches!(ApiError::from_status(404, ""), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(405, ""), ApiError::MethodNotAllowed(_)));
        assert!(matches!(ApiError::from_status(503, ""), ApiError::Server { status: 503, .. }));
        assert!(matches!(ApiError::from_status(418, "teapot"), ApiError::Unexpected { status: 418, .. }));
    }

    #[test]
    fn only_network_and_server_faults_retry() {
        assert!(ApiError::Network("down".into()).is_retryable());
        assert!(ApiError::from_status(500, "").is_retryable());
        assert!(!ApiError::from_status(404, "").is_retryable());
        assert!(!ApiError::NotAuthenticated.is_retryable());
    }

    #[test]
    fn user_messages_are_localized() {
        assert_eq!(ApiError::from_status(404, "").user_message(), "Recurso não encontrado.");
        assert_eq!(
            ApiError::Validation(String::new()).user_message(),
            "Dados inválidos: Verifique os campos e tente novamente."
        );
        assert_eq!(
            ApiError::from_status(418, "").user_message(),
            "Código: 418, Mensagem: Erro desconhecido"
        );
    }
}

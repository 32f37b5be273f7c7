use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::MS_ROLE_CLAIM;

pub struct TestConfig {
    pub backend_url: String,
    pub jwt_secret: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5000".to_string(),
            jwt_secret: None,
        }
    }
}

impl TestConfig {
    pub fn with_backend(backend_url: &str) -> Self {
        Self {
            backend_url: backend_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::with_backend(&self.backend_url)
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "recepcao".to_string(),
            role: "user".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(name: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role: role.to_string(),
        }
    }

    pub fn user(name: &str) -> Self {
        Self::new(name, "user")
    }

    pub fn admin(name: &str) -> Self {
        Self::new(name, "admin")
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    fn sign(payload: Value, secret: &str) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_token_expiring_in_minutes(user: &TestUser, secret: &str, minutes: i64) -> String {
        let now = Utc::now();
        let exp = now + Duration::minutes(minutes);

        Self::sign(
            json!({
                "sub": user.id,
                "unique_name": user.name,
                "role": user.role,
                "iat": now.timestamp(),
                "exp": exp.timestamp()
            }),
            secret,
        )
    }

    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        Self::create_token_expiring_in_minutes(user, secret, exp_hours.unwrap_or(24) * 60)
    }

    /// Token shaped like the ones ASP.NET Identity issues.
    pub fn create_ms_role_token(role: &str, secret: &str) -> String {
        let mut payload = serde_json::Map::new();
        payload.insert("sub".to_string(), json!(Uuid::new_v4().to_string()));
        payload.insert(MS_ROLE_CLAIM.to_string(), json!(role));
        payload.insert("exp".to_string(), json!((Utc::now() + Duration::hours(1)).timestamp()));
        Self::sign(Value::Object(payload), secret)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned payloads in the clinic backend's wire format.
pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn appointment(id: &str, date: &str, time: &str, status: &str) -> Value {
        json!({
            "id": id,
            "petId": "pet-1",
            "petName": "Rex",
            "serviceType": "Consulta",
            "date": date,
            "time": time,
            "status": status,
            "ownerName": "Ana",
            "ownerEmail": "ana@example.com"
        })
    }

    pub fn pet(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "species": "Cachorro",
            "breed": "Labrador",
            "breedId": "b-1",
            "age": 3,
            "sex": "male",
            "weight": 28.5,
            "ownerName": "Ana",
            "ownerEmail": "ana@example.com"
        })
    }

    pub fn breed(id: &str, name: &str, species: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "species": species
        })
    }

    pub fn notification(id: &str, status: &str, is_read: bool) -> Value {
        json!({
            "id": id,
            "recipientEmail": "ana@example.com",
            "petId": "pet-1",
            "petName": "Rex",
            "subject": "Lembrete de vacinação",
            "content": "A vacina do Rex está agendada.",
            "sentAt": "2024-05-15T10:30:00",
            "status": status,
            "appointmentId": "a-1",
            "appointmentType": "Vacinação",
            "isRead": is_read
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "message": message
        })
    }
}

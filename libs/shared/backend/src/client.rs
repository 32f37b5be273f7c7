use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::ApiError;

/// How a call treats the caller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No session means no request: fail with `NotAuthenticated` locally.
    Required,
    /// Attach the bearer token when there is one.
    Optional,
    /// Never send credentials.
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn schedule(config: &AppConfig) -> Self {
        Self::new(&config.schedule_api_url, config.backend_timeout)
    }

    pub fn pets(config: &AppConfig) -> Self {
        Self::new(&config.pets_api_url, config.backend_timeout)
    }

    pub fn notifications(config: &AppConfig) -> Self {
        Self::new(&config.notifications_api_url, config.backend_timeout)
    }

    /// Central session check: runs before anything touches the network.
    fn authorize<'a>(
        session: Option<&'a Session>,
        policy: AuthPolicy,
    ) -> Result<Option<&'a Session>, ApiError> {
        match (policy, session) {
            (AuthPolicy::Anonymous, _) => Ok(None),
            (AuthPolicy::Required, None) => {
                error!("No session available, refusing to call the backend");
                Err(ApiError::NotAuthenticated)
            }
            (_, Some(s)) if s.is_expired() => {
                warn!("Session expired or about to expire, refusing to call the backend");
                Err(ApiError::SessionExpired)
            }
            (_, s) => Ok(s),
        }
    }

    fn headers(session: Option<&Session>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(session) = session {
            let value = HeaderValue::from_str(&session.bearer())
                .map_err(|_| ApiError::NotAuthenticated)?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut req = self.client.request(method, url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Backend unreachable at {}: {}", url, e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(ApiError::from_status(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        // Some endpoints answer with a bare confirmation string.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// Sends one request and returns the raw JSON body (`Null` when empty).
    /// GET requests get a single retry on connectivity or server faults.
    pub async fn request_value(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        policy: AuthPolicy,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let session = Self::authorize(session, policy)?;
        let headers = Self::headers(session)?;
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let first = self
            .send_once(method.clone(), &url, headers.clone(), body.as_ref())
            .await;

        match first {
            Err(e) if method == Method::GET && e.is_retryable() => {
                warn!("Retrying GET {} after: {}", url, e);
                self.send_once(method, &url, headers, body.as_ref()).await
            }
            other => other,
        }
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        policy: AuthPolicy,
        body: Option<Value>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let value = self.request_value(method, path, session, policy, body).await?;
        serde_json::from_value(value).map_err(|e| {
            error!("Failed to decode backend response for {}: {}", path, e);
            ApiError::Decode(e.to_string())
        })
    }
}

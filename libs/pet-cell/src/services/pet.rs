use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use shared_backend::{AuthPolicy, BackendClient};
use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::ApiError;

use crate::models::{Pet, RegisterPetRequest, UpdatePetRequest};

const BASE_PATH: &str = "/api/Pets";

/// Every pets call needs a session; without one nothing is sent.
pub struct PetService {
    backend: BackendClient,
}

fn search_path(params: &[(&str, Option<&str>)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(format!("{}={}", key, urlencoding::encode(v))),
            _ => None,
        })
        .collect();

    if query.is_empty() {
        format!("{}/search", BASE_PATH)
    } else {
        format!("{}/search?{}", BASE_PATH, query.join("&"))
    }
}

fn item_path(id: &str) -> String {
    format!("{}/{}", BASE_PATH, urlencoding::encode(id))
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

impl PetService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::pets(config),
        }
    }

    pub async fn search(
        &self,
        species: Option<&str>,
        breed: Option<&str>,
        name: Option<&str>,
        session: Option<&Session>,
    ) -> Result<Vec<Pet>, ApiError> {
        let path = search_path(&[("species", species), ("breed", breed), ("name", name)]);
        debug!("Fetching pets from {}", path);

        self.backend
            .request(Method::GET, &path, session, AuthPolicy::Required, None)
            .await
    }

    pub async fn search_by_query(
        &self,
        query: &str,
        session: Option<&Session>,
    ) -> Result<Vec<Pet>, ApiError> {
        let path = search_path(&[("query", Some(query))]);
        self.backend
            .request(Method::GET, &path, session, AuthPolicy::Required, None)
            .await
    }

    pub async fn get(&self, id: &str, session: Option<&Session>) -> Result<Pet, ApiError> {
        self.backend
            .request(Method::GET, &item_path(id), session, AuthPolicy::Required, None)
            .await
    }

    pub async fn register(
        &self,
        request: &RegisterPetRequest,
        session: Option<&Session>,
    ) -> Result<Value, ApiError> {
        request.validate()?;
        info!("Registering pet {} ({})", request.name, request.species);

        self.backend
            .request_value(
                Method::POST,
                BASE_PATH,
                session,
                AuthPolicy::Required,
                Some(to_body(request)?),
            )
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdatePetRequest,
        session: Option<&Session>,
    ) -> Result<Value, ApiError> {
        request.validate()?;
        debug!("Updating pet {}", id);

        self.backend
            .request_value(
                Method::PUT,
                &item_path(id),
                session,
                AuthPolicy::Required,
                Some(to_body(request)?),
            )
            .await
    }

    pub async fn delete(&self, id: &str, session: Option<&Session>) -> Result<(), ApiError> {
        self.backend
            .request_value(Method::DELETE, &item_path(id), session, AuthPolicy::Required, None)
            .await?;
        info!("Pet {} deleted", id);
        Ok(())
    }
}

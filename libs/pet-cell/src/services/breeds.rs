use reqwest::Method;
use tracing::debug;

use shared_backend::{AuthPolicy, BackendClient};
use shared_config::AppConfig;
use shared_models::error::ApiError;

use crate::models::Breed;

/// Breed lookup is public on the pets service.
pub struct BreedService {
    backend: BackendClient,
}

impl BreedService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::pets(config),
        }
    }

    pub async fn breeds(&self, species: &str) -> Result<Vec<Breed>, ApiError> {
        if species.trim().is_empty() {
            return Err(ApiError::Validation("Espécie é obrigatória".to_string()));
        }

        let path = format!(
            "/api/PetsInfo/breeds?species={}",
            urlencoding::encode(species.trim())
        );
        debug!("Fetching breeds for species {}", species);

        self.backend
            .request(Method::GET, &path, None, AuthPolicy::Anonymous, None)
            .await
    }
}

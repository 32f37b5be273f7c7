use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{filter_pets, BreedQuery, PetListQuery, RegisterPetRequest, UpdatePetRequest};
use crate::services::{BreedService, PetService};

#[axum::debug_handler]
pub async fn list_pets(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Query(query): Query<PetListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = PetService::new(&config);

    let pets = match query.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(text) => service.search_by_query(text, Some(&session)).await?,
        None => {
            service
                .search(
                    query.species.as_deref(),
                    query.breed.as_deref(),
                    query.name.as_deref(),
                    Some(&session),
                )
                .await?
        }
    };
    let pets = filter_pets(pets, query.q.as_deref());

    Ok(Json(json!({
        "total": pets.len(),
        "pets": pets
    })))
}

#[axum::debug_handler]
pub async fn get_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let pet = PetService::new(&config).get(&pet_id, Some(&session)).await?;

    Ok(Json(json!(pet)))
}

#[axum::debug_handler]
pub async fn register_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Json(request): Json<RegisterPetRequest>,
) -> Result<Json<Value>, AppError> {
    let created = PetService::new(&config)
        .register(&request, Some(&session))
        .await?;

    Ok(Json(json!({
        "success": true,
        "pet": created,
        "message": "Pet cadastrado com sucesso"
    })))
}

#[axum::debug_handler]
pub async fn update_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<String>,
    Json(request): Json<UpdatePetRequest>,
) -> Result<Json<Value>, AppError> {
    let updated = PetService::new(&config)
        .update(&pet_id, &request, Some(&session))
        .await?;

    Ok(Json(json!({
        "success": true,
        "pet": updated,
        "message": "Pet atualizado com sucesso"
    })))
}

#[axum::debug_handler]
pub async fn delete_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    PetService::new(&config).delete(&pet_id, Some(&session)).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Pet excluído com sucesso"
    })))
}

#[axum::debug_handler]
pub async fn get_breeds(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<BreedQuery>,
) -> Result<Json<Value>, AppError> {
    let species = query.species.unwrap_or_default();
    let breeds = BreedService::new(&config).breeds(&species).await?;

    Ok(Json(json!({
        "species": species,
        "breeds": breeds
    })))
}

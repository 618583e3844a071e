use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::model::{Id, Ingredient, NewIngredient};
use crate::store::traits::{IngredientStore, Store};

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Create an inventory ingredient, refusing names that already exist
pub async fn create_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiJson(new_ingredient): ApiJson<NewIngredient>,
) -> Result<Json<Ingredient>, ApiError> {
    let name = new_ingredient.name.clone();

    match store.create_ingredient(new_ingredient).await? {
        Some(ingredient) => {
            log::info!("Created ingredient {} '{}'", ingredient.id, ingredient.name);
            Ok(Json(ingredient))
        }
        None => {
            log::warn!("Rejected duplicate ingredient '{}'", name);
            Err(ApiError::IngredientExists(name))
        }
    }
}

pub async fn list_ingredients<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    Ok(Json(store.list_ingredients().await?))
}

pub async fn get_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Ingredient>, ApiError> {
    store
        .get_ingredient(id)
        .await?
        .map(Json)
        .ok_or(ApiError::IngredientNotFound(id))
}

/// Replace name and amount. Unlike create, the name is not checked for duplicates.
pub async fn update_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(update): ApiJson<NewIngredient>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = store
        .update_ingredient(id, update)
        .await?
        .ok_or(ApiError::IngredientNotFound(id))?;

    log::info!("Updated ingredient {}", id);
    Ok(Json(ingredient))
}

pub async fn delete_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
) -> Result<String, ApiError> {
    if !store.delete_ingredient(id).await? {
        return Err(ApiError::IngredientNotFound(id));
    }

    log::info!("Deleted ingredient {}", id);
    Ok(format!("Ingredient with id {} has been deleted successfully.", id))
}

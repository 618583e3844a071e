use axum::{extract::State, response::Json};

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::handlers::AppState;
use crate::model::{Id, NewRecipe, NewRecipeIngredient, Recipe, RecipeIngredient};
use crate::store::traits::{RecipeIngredientStore, RecipeStore, Store};

// Recipes

pub async fn create_recipe<S: Store>(
    State(store): State<AppState<S>>,
    ApiJson(new_recipe): ApiJson<NewRecipe>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = store.create_recipe(new_recipe).await?;
    log::info!(
        "Created recipe {} '{}' with {} ingredient(s)",
        recipe.id,
        recipe.name,
        recipe.recipe_ingredients.len()
    );
    Ok(Json(recipe))
}

pub async fn list_recipes<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(store.list_recipes().await?))
}

pub async fn get_recipe<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Recipe>, ApiError> {
    store
        .get_recipe(id)
        .await?
        .map(Json)
        .ok_or(ApiError::RecipeNotFound(id))
}

/// Replace name, price and the full ingredient collection of a recipe
pub async fn update_recipe<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(update): ApiJson<NewRecipe>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = store
        .update_recipe(id, update)
        .await?
        .ok_or(ApiError::RecipeNotFound(id))?;

    log::info!("Updated recipe {}", id);
    Ok(Json(recipe))
}

pub async fn delete_recipe<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
) -> Result<String, ApiError> {
    if !store.delete_recipe(id).await? {
        return Err(ApiError::RecipeNotFound(id));
    }

    log::info!("Deleted recipe {} and its ingredients", id);
    Ok(format!("Recipe with id {} has been deleted successfully.", id))
}

// Recipe ingredients

pub async fn create_recipe_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiJson(new_recipe_ingredient): ApiJson<NewRecipeIngredient>,
) -> Result<Json<RecipeIngredient>, ApiError> {
    let recipe_ingredient = store.create_recipe_ingredient(new_recipe_ingredient).await?;
    log::info!("Created recipe ingredient {}", recipe_ingredient.id);
    Ok(Json(recipe_ingredient))
}

pub async fn list_recipe_ingredients<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<Vec<RecipeIngredient>>, ApiError> {
    Ok(Json(store.list_recipe_ingredients().await?))
}

pub async fn get_recipe_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<RecipeIngredient>, ApiError> {
    store
        .get_recipe_ingredient(id)
        .await?
        .map(Json)
        .ok_or(ApiError::RecipeIngredientNotFound(id))
}

pub async fn update_recipe_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(update): ApiJson<NewRecipeIngredient>,
) -> Result<Json<RecipeIngredient>, ApiError> {
    let recipe_ingredient = store
        .update_recipe_ingredient(id, update)
        .await?
        .ok_or(ApiError::RecipeIngredientNotFound(id))?;

    log::info!("Updated recipe ingredient {}", id);
    Ok(Json(recipe_ingredient))
}

pub async fn delete_recipe_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    ApiPath(id): ApiPath<Id>,
) -> Result<String, ApiError> {
    if !store.delete_recipe_ingredient(id).await? {
        return Err(ApiError::RecipeIngredientNotFound(id));
    }

    log::info!("Deleted recipe ingredient {}", id);
    Ok(format!("Recipe ingredient with id {} has been deleted successfully.", id))
}

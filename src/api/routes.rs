use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::{handlers, purchase_handlers, recipe_handlers};
use crate::config::CorsConfig;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Inventory ingredients
        .route("/ingredient", post(handlers::create_ingredient::<S>))
        .route("/ingredients", get(handlers::list_ingredients::<S>))
        .route(
            "/ingredient/:id",
            get(handlers::get_ingredient::<S>)
                .put(handlers::update_ingredient::<S>)
                .delete(handlers::delete_ingredient::<S>),
        )
        // Recipes (writes cascade to their recipe ingredients)
        .route("/recipe", post(recipe_handlers::create_recipe::<S>))
        .route("/recipes", get(recipe_handlers::list_recipes::<S>))
        .route(
            "/recipe/:id",
            get(recipe_handlers::get_recipe::<S>)
                .put(recipe_handlers::update_recipe::<S>)
                .delete(recipe_handlers::delete_recipe::<S>),
        )
        // Recipe ingredients
        .route(
            "/recipeIngredient",
            post(recipe_handlers::create_recipe_ingredient::<S>),
        )
        .route(
            "/recipeIngredients",
            get(recipe_handlers::list_recipe_ingredients::<S>),
        )
        .route(
            "/recipeIngredient/:id",
            get(recipe_handlers::get_recipe_ingredient::<S>)
                .put(recipe_handlers::update_recipe_ingredient::<S>)
                .delete(recipe_handlers::delete_recipe_ingredient::<S>),
        )
        // Purchasing
        .route("/purchase", post(purchase_handlers::purchase_recipes::<S>))
}

/// CORS restricted to the single configured front-end origin
pub fn cors_layer(cors: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = cors
        .allowed_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin '{}'", cors.allowed_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Router with state and middleware applied, ready to serve
pub fn build_app<S: Store + 'static>(store: Arc<S>, cors: &CorsConfig) -> anyhow::Result<Router> {
    Ok(create_router::<S>().with_state(store).layer(cors_layer(cors)?))
}

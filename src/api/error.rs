use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::logic::PurchaseError;
use crate::model::Id;

/// Every failure a handler can report, mapped to a status code in one place
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Could not find the ingredient with id {0}")]
    IngredientNotFound(Id),
    #[error("Could not find the recipe with id {0}")]
    RecipeNotFound(Id),
    #[error("Could not find the recipe ingredient with id {0}")]
    RecipeIngredientNotFound(Id),
    #[error("Ingredient {0} already exists")]
    IngredientExists(String),
    #[error("{0}")]
    InsufficientInventory(String),
    /// Malformed body or path, or a request that fails validation
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::IngredientNotFound(_)
            | ApiError::RecipeNotFound(_)
            | ApiError::RecipeIngredientNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::IngredientExists(_) | ApiError::InsufficientInventory(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_message: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error_message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            log::error!("Request failed: {:#}", e);
        }

        (self.status(), Json(ErrorResponse::new(&self.to_string()))).into_response()
    }
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::RecipeNotFound(id) => ApiError::RecipeNotFound(id),
            PurchaseError::InsufficientInventory(_) => ApiError::InsufficientInventory(err.to_string()),
            PurchaseError::Store(e) => ApiError::Internal(e),
            PurchaseError::NothingSelected
            | PurchaseError::InvalidCount { .. }
            | PurchaseError::InvalidPayment(_)
            | PurchaseError::InsufficientPayment { .. }
            | PurchaseError::AmountOutOfRange => ApiError::BadRequest(err.to_string()),
        }
    }
}

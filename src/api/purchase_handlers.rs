use axum::{extract::State, response::Json};

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::handlers::AppState;
use crate::logic::PurchaseProcessor;
use crate::model::{PurchaseReceipt, PurchaseRequest};
use crate::store::traits::Store;

/// Buy one or more recipes, deducting their ingredients from the inventory
pub async fn purchase_recipes<S: Store>(
    State(store): State<AppState<S>>,
    ApiJson(request): ApiJson<PurchaseRequest>,
) -> Result<Json<PurchaseReceipt>, ApiError> {
    match PurchaseProcessor::purchase(store.as_ref(), &request).await {
        Ok(receipt) => Ok(Json(receipt)),
        Err(e) => {
            log::warn!("Purchase rejected: {}", e);
            Err(e.into())
        }
    }
}

use crate::model::{Id, Ingredient};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub recipe_id: Id,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub items: Vec<PurchaseItem>,
    pub payment: i64,
}

/// Amount to take out of one inventory ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDeduction {
    pub ingredient_id: Id,
    pub name: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub total: i64,
    pub change: i64,
    pub ingredients: Vec<Ingredient>, // Inventory rows after deduction
}

use std::collections::HashMap;

use crate::model::{Id, Ingredient, InventoryDeduction, PurchaseReceipt, PurchaseRequest, Recipe};
use crate::store::traits::{IngredientStore, InventoryStore, RecipeStore, Store};

#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("No recipes selected for purchase")]
    NothingSelected,
    #[error("Recipe count must be greater than 0")]
    InvalidCount { recipe_id: Id, count: i32 },
    #[error("Could not find the recipe with id {0}")]
    RecipeNotFound(Id),
    #[error("Payment must be greater than 0")]
    InvalidPayment(i64),
    #[error("Payment of {payment} is less than the total price of {total}")]
    InsufficientPayment { payment: i64, total: i64 },
    #[error("Order total is out of range")]
    AmountOutOfRange,
    #[error("Not enough {0} in stock")]
    InsufficientInventory(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What a validated purchase costs and takes out of the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasePlan {
    pub total: i64,
    pub deductions: Vec<InventoryDeduction>,
}

pub struct PurchaseProcessor;

impl PurchaseProcessor {
    /// Validate the order, charge it and deduct the ingredients it consumes.
    ///
    /// Checks run in order: selection, counts, payment, recipes exist, price, stock.
    /// Stock is deducted atomically; a failed purchase leaves it untouched.
    pub async fn purchase<S: Store>(
        store: &S,
        request: &PurchaseRequest,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        Self::validate_selection(request)?;

        let mut recipes = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let recipe = store
                .get_recipe(item.recipe_id)
                .await?
                .ok_or(PurchaseError::RecipeNotFound(item.recipe_id))?;
            recipes.push((recipe, item.count));
        }

        let inventory = store.list_ingredients().await?;
        let plan = Self::plan(&recipes, &inventory, request.payment)?;

        let change = request
            .payment
            .checked_sub(plan.total)
            .ok_or(PurchaseError::AmountOutOfRange)?;

        let ingredients = match store.deduct_inventory(&plan.deductions).await? {
            Ok(updated) => updated,
            Err(short) => return Err(PurchaseError::InsufficientInventory(short.name)),
        };

        log::info!(
            "Purchase of {} recipe(s) completed: total {}, {} ingredient(s) deducted",
            recipes.len(),
            plan.total,
            ingredients.len()
        );

        Ok(PurchaseReceipt {
            total: plan.total,
            change,
            ingredients,
        })
    }

    fn validate_selection(request: &PurchaseRequest) -> Result<(), PurchaseError> {
        if request.items.is_empty() {
            return Err(PurchaseError::NothingSelected);
        }
        if let Some(item) = request.items.iter().find(|item| item.count <= 0) {
            return Err(PurchaseError::InvalidCount {
                recipe_id: item.recipe_id,
                count: item.count,
            });
        }
        if request.payment <= 0 {
            return Err(PurchaseError::InvalidPayment(request.payment));
        }
        Ok(())
    }

    /// Price the order and sum what it needs per inventory ingredient.
    ///
    /// Recipe ingredients are matched to the inventory by exact name; those
    /// without a match are not tracked and consume nothing. When several
    /// inventory rows share a name the first one listed is used.
    pub fn plan(
        recipes: &[(Recipe, i32)],
        inventory: &[Ingredient],
        payment: i64,
    ) -> Result<PurchasePlan, PurchaseError> {
        let total = recipes
            .iter()
            .try_fold(0i64, |total, (recipe, count)| {
                total.checked_add(i64::from(recipe.price) * i64::from(*count))
            })
            .ok_or(PurchaseError::AmountOutOfRange)?;

        if payment < total {
            return Err(PurchaseError::InsufficientPayment { payment, total });
        }

        let mut by_name: HashMap<&str, &Ingredient> = HashMap::new();
        for ingredient in inventory {
            by_name.entry(ingredient.name.as_str()).or_insert(ingredient);
        }

        // First-seen order keeps the plan deterministic
        let mut needed: Vec<(&Ingredient, i64)> = Vec::new();
        for (recipe, count) in recipes {
            for recipe_ingredient in &recipe.recipe_ingredients {
                let Some(&stock) = by_name.get(recipe_ingredient.name.as_str()) else {
                    continue;
                };
                let amount = i64::from(recipe_ingredient.amount) * i64::from(*count);
                match needed.iter_mut().find(|(ingredient, _)| ingredient.id == stock.id) {
                    Some((_, total_needed)) => *total_needed += amount,
                    None => needed.push((stock, amount)),
                }
            }
        }

        let mut deductions = Vec::with_capacity(needed.len());
        for (ingredient, amount) in needed {
            if amount > i64::from(ingredient.amount) {
                return Err(PurchaseError::InsufficientInventory(ingredient.name.clone()));
            }
            if amount <= 0 {
                continue;
            }
            deductions.push(InventoryDeduction {
                ingredient_id: ingredient.id,
                name: ingredient.name.clone(),
                // Bounded by the current stock, which is an i32
                amount: amount as i32,
            });
        }

        Ok(PurchasePlan { total, deductions })
    }
}

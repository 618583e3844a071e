use crate::model::{
    Id, Ingredient, InventoryDeduction, NewIngredient, NewRecipe, NewRecipeIngredient, Recipe,
    RecipeIngredient,
};
use anyhow::Result;

/// Updated inventory rows, or the deduction that could not be covered
pub type DeductionOutcome = std::result::Result<Vec<Ingredient>, InventoryDeduction>;

/// Inventory ingredient persistence
#[async_trait::async_trait]
pub trait IngredientStore: Send + Sync {
    /// All ingredients in ascending id order
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>>;
    async fn get_ingredient(&self, id: Id) -> Result<Option<Ingredient>>;
    /// Insert an ingredient unless one with exactly the same name exists.
    ///
    /// Returns `None` when the name is taken. The check and the insert are
    /// atomic with respect to other creates.
    async fn create_ingredient(&self, ingredient: NewIngredient) -> Result<Option<Ingredient>>;
    /// Replace name and amount. Returns `None` if the id does not exist.
    async fn update_ingredient(&self, id: Id, ingredient: NewIngredient) -> Result<Option<Ingredient>>;
    async fn delete_ingredient(&self, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait RecipeIngredientStore: Send + Sync {
    async fn list_recipe_ingredients(&self) -> Result<Vec<RecipeIngredient>>;
    async fn get_recipe_ingredient(&self, id: Id) -> Result<Option<RecipeIngredient>>;
    async fn create_recipe_ingredient(&self, recipe_ingredient: NewRecipeIngredient) -> Result<RecipeIngredient>;
    async fn update_recipe_ingredient(
        &self,
        id: Id,
        recipe_ingredient: NewRecipeIngredient,
    ) -> Result<Option<RecipeIngredient>>;
    /// Deleting a linked row also drops it from the owning recipe
    async fn delete_recipe_ingredient(&self, id: Id) -> Result<bool>;
}

/// Recipe persistence. Writes cascade to the owned recipe ingredients.
#[async_trait::async_trait]
pub trait RecipeStore: Send + Sync {
    async fn list_recipes(&self) -> Result<Vec<Recipe>>;
    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>>;
    /// Insert the recipe, its ingredient rows and the links between them
    async fn create_recipe(&self, recipe: NewRecipe) -> Result<Recipe>;
    /// Replace name, price and the whole ingredient collection.
    ///
    /// Previously owned ingredient rows are deleted.
    async fn update_recipe(&self, id: Id, recipe: NewRecipe) -> Result<Option<Recipe>>;
    /// Delete the recipe together with its owned ingredient rows
    async fn delete_recipe(&self, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    /// Subtract every deduction from the inventory, all or nothing.
    ///
    /// The inner `Err` carries the first deduction that could not be covered
    /// (ingredient gone or stock would go below zero); stock is left untouched.
    async fn deduct_inventory(
        &self,
        deductions: &[InventoryDeduction],
    ) -> Result<DeductionOutcome>;
}

pub trait Store: IngredientStore + RecipeIngredientStore + RecipeStore + InventoryStore + Send + Sync {}
